//! System prompt for the completion call.

use crate::config::CompanyProfile;

use super::model::LeadField;
use super::state::{ConversationState, IntakeStep};

/// The field the assistant should ask for next, given the current state.
pub fn next_missing_field(state: &ConversationState) -> Option<LeadField> {
    let wanted: &[LeadField] = match state.step {
        IntakeStep::Greeting | IntakeStep::InfoCollection => &[LeadField::Name, LeadField::Email],
        IntakeStep::ProjectDetails => &[LeadField::ProjectType, LeadField::Description],
        IntakeStep::ContactReady => &[LeadField::Timeline, LeadField::Budget],
    };

    if state.step == IntakeStep::ProjectDetails && state.fields.has_project_info() {
        return None;
    }
    wanted.iter().copied().find(|f| !state.fields.is_set(*f))
}

/// Build the system prompt for the current conversation state.
pub fn build_system_prompt(company: &CompanyProfile, state: &ConversationState) -> String {
    let collected = serde_json::to_string(&state.fields).unwrap_or_else(|_| "{}".to_string());
    let next_field = match next_missing_field(state) {
        Some(field) => format!(
            "- Next detail to request: {}. Ask for it in one short prompt.",
            field.label()
        ),
        None => format!(
            "- All key details are collected. Direct the user to {} or the contact form.",
            company.contact_email
        ),
    };

    format!(
        "\
You are {name}'s AI assistant. You must be professional, crisp, and focused on business outcomes. \
Your primary goal is to collect the user's initial details and guide them to contact {name}, not to have long chats.

COMPANY INFORMATION:
- Name: {name}
- Vision: \"{tagline}\"
- Services: {services}
- Contact: {email}, {phone}
- Location: {location}
- Stats: {stats}

YOUR PERSONALITY:
- Professional, friendly, and concise
- Avoid chit-chat; keep responses short and structured
- No more than one short question at a time when absolutely necessary
- Prefer statements that guide users to provide details

CURRENT CONTEXT:
- Conversation Step: {step}
- User Info Collected: {collected}
- Intent: {intent}
{next_field}

STRICT BOUNDARIES:
- Only answer questions related to {name}, its services, process, capabilities, and engagement. \
If asked anything unrelated, politely decline and steer back to {name}.
- Do NOT provide generic tech support, personal opinions, or information outside {name}.

RESPONSE POLICY:
- Briefly acknowledge the user's goal, then ask for the minimum necessary details in one compact prompt.
- Preferred fields to collect (in order): Name, Email, Company (optional), Project Type \
(Web/Mobile/AI/Cloud/Custom), Brief Requirement (2-3 lines), Timeline/Budget (optional).
- Never ask again for details already listed under User Info Collected.
- End every message with a clear call-to-action: either \"Share your details here\" or \
\"Contact us at {email} or via the form.\"
- Keep responses to 1-3 short sentences or a compact bullet list.",
        name = company.name,
        tagline = company.tagline,
        services = company.services.join(", "),
        email = company.contact_email,
        phone = company.phone,
        location = company.location,
        stats = company.stats.join(", "),
        step = state.step,
        intent = state.intent,
    )
}
