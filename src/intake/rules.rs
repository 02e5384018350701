//! Ordered rule lists for intent classification and field extraction.
//!
//! Both are evaluated top to bottom and the first matching rule wins, so the
//! order of the tables below is part of the behavior.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::model::{Intent, LeadField, LeadFields};
use super::state::IntakeStep;

// ── Intent ──────────────────────────────────────────────────────────────

struct IntentRule {
    intent: Intent,
    keywords: &'static [&'static str],
}

const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::ProjectInquiry,
        keywords: &["project", "app", "website", "build"],
    },
    IntentRule {
        intent: Intent::ServiceInquiry,
        keywords: &["service", "what do you do", "capabilities"],
    },
    IntentRule {
        intent: Intent::PricingInquiry,
        keywords: &["price", "cost", "budget"],
    },
    IntentRule {
        intent: Intent::ContactRequest,
        keywords: &["contact", "call", "email"],
    },
];

/// Classify an utterance by plain substring match over its lower-cased text.
pub fn classify_intent(utterance: &str) -> Intent {
    let lower = utterance.to_lowercase();
    INTENT_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map(|rule| rule.intent)
        .unwrap_or_default()
}

// ── Field extraction ────────────────────────────────────────────────────

/// How a rule turns a regex match into a field value.
enum Capture {
    /// Use capture group 1, trimmed of whitespace and trailing `.,`.
    Group,
    /// Use the whole match, trimmed.
    Whole,
    /// Replace the match with a canonical label.
    Label(&'static str),
}

/// Which view of the utterance a rule reads.
#[derive(Clone, Copy)]
enum Scope {
    /// The utterance as typed.
    Raw,
    /// Email addresses and `$` amounts blanked out.
    Digits,
    /// Email addresses and phone numbers blanked out.
    Project,
}

/// The utterance with contact details blanked to spaces. Byte offsets match
/// the raw text.
struct Views<'a> {
    raw: &'a str,
    digits: String,
    project: String,
}

impl<'a> Views<'a> {
    fn new(raw: &'a str) -> Self {
        let no_email = blank_matches(&EMAIL, raw);
        let digits = blank_matches(&AMOUNT, &no_email);
        let mut project = no_email.into_bytes();
        for m in PHONE.find_iter(&digits) {
            project[m.range()].fill(b' ');
        }
        // Only ASCII spaces were written over whole matches, so this stays UTF-8.
        let project = String::from_utf8(project).unwrap_or_default();
        Self {
            raw,
            digits,
            project,
        }
    }

    fn get(&self, scope: Scope) -> &str {
        match scope {
            Scope::Raw => self.raw,
            Scope::Digits => &self.digits,
            Scope::Project => &self.project,
        }
    }
}

fn blank_matches(regex: &Regex, text: &str) -> String {
    regex
        .replace_all(text, |caps: &regex::Captures<'_>| " ".repeat(caps[0].len()))
        .into_owned()
}

struct ExtractionRule {
    field: LeadField,
    regex: Regex,
    capture: Capture,
    scope: Scope,
}

impl ExtractionRule {
    fn new(field: LeadField, pattern: &str, capture: Capture) -> Self {
        let scope = match field {
            LeadField::Phone => Scope::Digits,
            LeadField::ProjectType | LeadField::Budget | LeadField::Timeline => Scope::Project,
            _ => Scope::Raw,
        };
        Self {
            field,
            regex: Regex::new(pattern).unwrap(),
            capture,
            scope,
        }
    }

    fn apply(&self, utterance: &str) -> Option<String> {
        let caps = self.regex.captures(utterance)?;
        let value = match self.capture {
            Capture::Group => caps
                .get(1)?
                .as_str()
                .trim()
                .trim_end_matches(['.', ','])
                .trim_end()
                .to_string(),
            Capture::Whole => caps.get(0)?.as_str().trim().to_string(),
            Capture::Label(label) => label.to_string(),
        };
        (!value.is_empty()).then_some(value)
    }
}

const EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";
const PHONE_PATTERN: &str =
    r"(?:\+?1?[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).unwrap());
static EMAIL_EXACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{EMAIL_PATTERN}$")).unwrap());
static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(PHONE_PATTERN).unwrap());
static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[ \t]?\d[\d,]*(?:\.\d+)?").unwrap());

/// Extraction rules in evaluation order. A field may have several rules; the
/// first one that matches sets it.
static EXTRACTION_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    use Capture::*;
    use LeadField::*;

    vec![
        // Up to three words after the introduction phrase.
        ExtractionRule::new(
            Name,
            r"(?i)\b(?:my name is|i am|i'm)[ \t]+([a-z]+(?:[ \t]+[a-z]+){0,2})",
            Group,
        ),
        ExtractionRule::new(Email, &format!("({EMAIL_PATTERN})"), Group),
        ExtractionRule::new(
            Company,
            r"(?i)\b(?:company is|i work at|we are)[ \t]+([a-z][a-z \t&.,]*)",
            Group,
        ),
        ExtractionRule::new(Phone, PHONE_PATTERN, Whole),
        // Project vocabulary offered by the project-details quick actions.
        ExtractionRule::new(
            ProjectType,
            r"(?i)\b(?:web[ \t]*(?:app|application|site|platform)s?|websites?|e-?commerce)\b",
            Label("Web Application"),
        ),
        ExtractionRule::new(
            ProjectType,
            r"(?i)\b(?:mobile[ \t]*apps?|mobile[ \t]+application|ios|android)\b",
            Label("Mobile App"),
        ),
        ExtractionRule::new(
            ProjectType,
            r"(?i)\b(?:ai[ \t]*/[ \t]*ml|machine learning|artificial intelligence|chatbot|ai)\b",
            Label("AI/ML Solution"),
        ),
        ExtractionRule::new(
            ProjectType,
            r"(?i)\b(?:cloud|devops|aws|azure|kubernetes)\b",
            Label("Cloud & DevOps"),
        ),
        ExtractionRule::new(
            ProjectType,
            r"(?i)\b(?:ui[ \t]*/[ \t]*ux|ux|user experience|redesign)\b",
            Label("UI/UX Design"),
        ),
        ExtractionRule::new(
            ProjectType,
            r"(?i)\bcustom[ \t]+(?:software|development|solution)\b",
            Label("Custom Development"),
        ),
        ExtractionRule::new(
            Budget,
            r"(?i)(?:\$[ \t]?\d[\d,]*(?:\.\d+)?[ \t]?[km]?\b|\b\d[\d,]*(?:\.\d+)?[ \t]?[km]?[ \t]?(?:usd|dollars)\b)",
            Whole,
        ),
        ExtractionRule::new(
            Timeline,
            r"(?i)\b(?:asap|as soon as possible|\d+(?:[ \t]*-[ \t]*\d+)?[ \t]*(?:days?|weeks?|months?|years?)|next[ \t]+(?:week|month|quarter|year)|q[1-4])\b",
            Whole,
        ),
    ]
});

/// Extract fields from an utterance.
///
/// Rules for fields already set in `existing` are skipped. Only newly extracted
/// fields are returned; the caller merges them.
pub fn extract_fields(utterance: &str, existing: &LeadFields) -> LeadFields {
    let mut extracted = LeadFields::default();
    let views = Views::new(utterance);

    for rule in EXTRACTION_RULES.iter() {
        if existing.is_set(rule.field) || extracted.is_set(rule.field) {
            continue;
        }
        if let Some(value) = rule.apply(views.get(rule.scope)) {
            debug!(field = %rule.field, "Extracted lead field");
            extracted.set_if_unset(rule.field, value);
        }
    }

    extracted
}

const BRIEF_MIN_WORDS: usize = 5;
const BRIEF_MAX_CHARS: usize = 500;

/// Capture a free-text project brief.
///
/// Only while the session is collecting project details and no description is
/// set yet. Utterances shorter than five words, or carrying an email address or
/// phone number, are not briefs.
pub fn extract_brief(utterance: &str, step: IntakeStep, existing: &LeadFields) -> Option<String> {
    if step != IntakeStep::ProjectDetails || existing.description.is_some() {
        return None;
    }

    let text = utterance.trim();
    if text.split_whitespace().count() < BRIEF_MIN_WORDS {
        return None;
    }
    if EMAIL.is_match(text) || PHONE.is_match(Views::new(text).get(Scope::Digits)) {
        return None;
    }

    Some(match text.char_indices().nth(BRIEF_MAX_CHARS) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    })
}

/// Whether the whole string has the `local@domain.tld` shape.
pub fn is_email(candidate: &str) -> bool {
    EMAIL_EXACT.is_match(candidate)
}

// ── Contextual canned replies ───────────────────────────────────────────

/// Topic of a keyword-matched canned reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTopic {
    Website,
    App,
    Software,
    Services,
    Pricing,
    Contact,
    Greeting,
}

struct TopicRule {
    topic: ReplyTopic,
    keywords: &'static [&'static str],
    /// Match keywords as whole words instead of substrings.
    whole_word: bool,
}

const TOPIC_RULES: &[TopicRule] = &[
    TopicRule {
        topic: ReplyTopic::Website,
        keywords: &["website", "web"],
        whole_word: false,
    },
    TopicRule {
        topic: ReplyTopic::App,
        keywords: &["app", "mobile"],
        whole_word: false,
    },
    TopicRule {
        topic: ReplyTopic::Software,
        keywords: &["software", "development"],
        whole_word: false,
    },
    TopicRule {
        topic: ReplyTopic::Services,
        keywords: &["service", "what do you do", "company"],
        whole_word: false,
    },
    TopicRule {
        topic: ReplyTopic::Pricing,
        keywords: &["price", "cost", "budget"],
        whole_word: false,
    },
    TopicRule {
        topic: ReplyTopic::Contact,
        keywords: &["contact", "call", "email"],
        whole_word: false,
    },
    // "hi" as a substring would match "this" and "which".
    TopicRule {
        topic: ReplyTopic::Greeting,
        keywords: &["hi", "hello", "hey"],
        whole_word: true,
    },
];

/// Pick the canned-reply topic for an utterance, if any keyword matches.
pub fn reply_topic(utterance: &str) -> Option<ReplyTopic> {
    let lower = utterance.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    TOPIC_RULES
        .iter()
        .find(|rule| {
            rule.keywords.iter().any(|k| {
                if rule.whole_word {
                    words.contains(k)
                } else {
                    lower.contains(k)
                }
            })
        })
        .map(|rule| rule.topic)
}
