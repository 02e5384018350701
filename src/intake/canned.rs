//! Canned copy: opening greeting, per-step fallbacks, keyword-matched
//! replies and quick-action chips.

use crate::config::CompanyProfile;

use super::model::QuickAction;
use super::rules::{ReplyTopic, reply_topic};
use super::state::IntakeStep;

/// Opening message shown when a chat session opens.
pub fn greeting(company: &CompanyProfile) -> String {
    format!(
        "Hello! 👋 I'm {}'s AI assistant. I'm here to help you learn about our AI-powered \
         software development services and guide you through starting your next project. \
         How can I assist you today?",
        company.name
    )
}

/// Reply used when the completion call fails, keyed by step.
pub fn step_fallback(step: IntakeStep, company: &CompanyProfile) -> String {
    match step {
        IntakeStep::Greeting => format!(
            "Hello! I'm here to help you learn about {}'s AI-powered software development \
             services. What brings you here today? 🚀",
            company.name
        ),
        IntakeStep::InfoCollection => "I'd love to learn more about your project! Could you share \
             your name and email so I can provide personalized assistance? 📝"
            .to_string(),
        IntakeStep::ProjectDetails => "Tell me more about your project requirements. What kind of \
             solution are you looking to build? 💡"
            .to_string(),
        IntakeStep::ContactReady => "Perfect! I have all the information I need. Let me connect you \
             with our team for a detailed consultation! ✨"
            .to_string(),
    }
}

/// Keyword-matched reply for when the model answered but said nothing useful.
///
/// Returns `None` when no topic keyword matches.
pub fn contextual_response(utterance: &str, company: &CompanyProfile) -> Option<String> {
    let email = &company.contact_email;
    let reply = match reply_topic(utterance)? {
        ReplyTopic::Website => format!(
            "We can build your website end-to-end (design, development, scalable hosting). \
             Please share: Name, Email, Project Type, and a 2-3 line brief. You can also \
             contact us at {email} to proceed."
        ),
        ReplyTopic::App => format!(
            "We deliver iOS/Android apps with secure, scalable backends. Share your Name, \
             Email, Project Type, and a short brief, or email {email} to start."
        ),
        ReplyTopic::Software => format!(
            "We build custom software aligned to your goals (web, mobile, AI/ML, cloud). \
             Provide: Name, Email, Project Type, brief requirement (2-3 lines). Or contact {email}."
        ),
        ReplyTopic::Services => format!(
            "{} delivers {}. Share your Name, Email, Project Type, and a short brief, or \
             contact us at {email} to proceed.",
            company.name,
            company.services.join(", ")
        ),
        ReplyTopic::Pricing => format!(
            "Pricing depends on scope and complexity. Share your Name, Email, Project Type, \
             and a brief requirement for a tailored estimate, or email {email} to schedule a \
             consultation."
        ),
        ReplyTopic::Contact => format!(
            "You can reach us at {email} or submit the form. If you'd like, share your Name, \
             Email, Project Type, and a short brief here and we'll follow up."
        ),
        ReplyTopic::Greeting => format!(
            "Welcome to {}. To assist you, please share: Name, Email, Project Type \
             (Web/Mobile/AI/Cloud/Custom), and a 2-3 line brief. You can also contact us at \
             {email}.",
            company.name
        ),
    };
    Some(reply)
}

/// Whether a remote reply should be replaced by canned copy.
///
/// True when the model returned nothing, or parroted one of our own fallback
/// sentences back.
pub fn is_unhelpful_reply(content: Option<&str>, company: &CompanyProfile) -> bool {
    let Some(text) = content.map(str::trim).filter(|t| !t.is_empty()) else {
        return true;
    };
    IntakeStep::ALL
        .into_iter()
        .map(|step| step_fallback(step, company))
        .chain(std::iter::once(greeting(company)))
        .any(|canned| text.contains(canned.trim()))
}

const GREETING_ACTIONS: &[QuickAction] = &[
    QuickAction {
        label: "Tell me about your services",
        icon: "🔧",
        action: "services",
    },
    QuickAction {
        label: "I need a custom app",
        icon: "📱",
        action: "project",
    },
    QuickAction {
        label: "What's your pricing?",
        icon: "💰",
        action: "pricing",
    },
    QuickAction {
        label: "Contact your team",
        icon: "📞",
        action: "contact",
    },
];

const INFO_COLLECTION_ACTIONS: &[QuickAction] = &[
    QuickAction {
        label: "My name is John",
        icon: "👤",
        action: "name",
    },
    QuickAction {
        label: "john@company.com",
        icon: "📧",
        action: "email",
    },
    QuickAction {
        label: "I work at TechCorp",
        icon: "🏢",
        action: "company",
    },
    QuickAction {
        label: "Skip to project details",
        icon: "⏭️",
        action: "skip",
    },
];

const PROJECT_DETAILS_ACTIONS: &[QuickAction] = &[
    QuickAction {
        label: "Web Application",
        icon: "🌐",
        action: "web-app",
    },
    QuickAction {
        label: "Mobile App",
        icon: "📱",
        action: "mobile-app",
    },
    QuickAction {
        label: "AI/ML Solution",
        icon: "🤖",
        action: "ai-ml",
    },
    QuickAction {
        label: "Custom Development",
        icon: "⚙️",
        action: "custom",
    },
];

const CONTACT_READY_ACTIONS: &[QuickAction] = &[
    QuickAction {
        label: "Submit my information",
        icon: "📝",
        action: "submit",
    },
    QuickAction {
        label: "Schedule a call",
        icon: "📅",
        action: "schedule",
    },
    QuickAction {
        label: "Send email",
        icon: "✉️",
        action: "email",
    },
    QuickAction {
        label: "Start over",
        icon: "🔄",
        action: "restart",
    },
];

/// Suggestion chips for a step. They only pre-fill the input box.
pub fn quick_actions(step: IntakeStep) -> &'static [QuickAction] {
    match step {
        IntakeStep::Greeting => GREETING_ACTIONS,
        IntakeStep::InfoCollection => INFO_COLLECTION_ACTIONS,
        IntakeStep::ProjectDetails => PROJECT_DETAILS_ACTIONS,
        IntakeStep::ContactReady => CONTACT_READY_ACTIONS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company() -> CompanyProfile {
        CompanyProfile::default()
    }

    #[test]
    fn every_step_has_a_non_empty_fallback() {
        for step in IntakeStep::ALL {
            assert!(!step_fallback(step, &company()).is_empty());
        }
    }

    #[test]
    fn greeting_actions_are_stable() {
        let first = quick_actions(IntakeStep::Greeting);
        let second = quick_actions(IntakeStep::Greeting);
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
        let tags: Vec<&str> = first.iter().map(|a| a.action).collect();
        assert_eq!(tags, ["services", "project", "pricing", "contact"]);
    }

    #[test]
    fn every_step_has_four_actions() {
        for step in IntakeStep::ALL {
            assert_eq!(quick_actions(step).len(), 4, "{step}");
        }
        assert_eq!(quick_actions(IntakeStep::ContactReady)[3].action, "restart");
    }

    #[test]
    fn project_actions_extract_a_project_type() {
        use crate::intake::model::LeadFields;
        use crate::intake::rules::extract_fields;

        for action in quick_actions(IntakeStep::ProjectDetails) {
            let out = extract_fields(action.label, &LeadFields::default());
            assert!(out.project_type.is_some(), "{}", action.label);
        }
    }

    #[test]
    fn contextual_response_uses_contact_email() {
        let reply = contextual_response("Do you build websites?", &company()).unwrap();
        assert!(reply.contains("website"));
        assert!(reply.contains("brijtech2025@gmail.com"));
    }

    #[test]
    fn contextual_response_none_without_keywords() {
        assert!(contextual_response("ok thanks", &company()).is_none());
    }

    #[test]
    fn services_reply_lists_services() {
        let reply = contextual_response("tell me about the company", &company()).unwrap();
        assert!(reply.contains("AI/ML Solutions"));
    }

    #[test]
    fn blank_or_missing_reply_is_unhelpful() {
        assert!(is_unhelpful_reply(None, &company()));
        assert!(is_unhelpful_reply(Some("   \n"), &company()));
    }

    #[test]
    fn echoed_fallback_is_unhelpful() {
        let echoed = step_fallback(IntakeStep::Greeting, &company());
        assert!(is_unhelpful_reply(Some(&echoed), &company()));
        let wrapped = format!("Sure. {echoed}");
        assert!(is_unhelpful_reply(Some(&wrapped), &company()));
    }

    #[test]
    fn real_reply_is_helpful() {
        assert!(!is_unhelpful_reply(
            Some("We can help with your clothing brand website. Please share your Name and Email."),
            &company()
        ));
    }
}
