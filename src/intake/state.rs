//! Intake state machine: the conversation step and per-session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{Intent, LeadFields};
use super::rules::classify_intent;

/// The stages of the intake conversation.
///
/// Progresses forward only: Greeting → InfoCollection → ProjectDetails →
/// ContactReady. Variant order is the progression order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    #[default]
    Greeting,
    InfoCollection,
    ProjectDetails,
    ContactReady,
}

impl IntakeStep {
    pub const ALL: [IntakeStep; 4] = [
        IntakeStep::Greeting,
        IntakeStep::InfoCollection,
        IntakeStep::ProjectDetails,
        IntakeStep::ContactReady,
    ];

    /// Whether this step is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ContactReady)
    }

    /// The following step, if any.
    pub fn next(&self) -> Option<IntakeStep> {
        match self {
            Self::Greeting => Some(Self::InfoCollection),
            Self::InfoCollection => Some(Self::ProjectDetails),
            Self::ProjectDetails => Some(Self::ContactReady),
            Self::ContactReady => None,
        }
    }
}

impl std::fmt::Display for IntakeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Greeting => "greeting",
            Self::InfoCollection => "info_collection",
            Self::ProjectDetails => "project_details",
            Self::ContactReady => "contact_ready",
        };
        write!(f, "{s}")
    }
}

/// Compute the step after a turn.
///
/// Advances at most one stage and never moves backward. `fields` must already
/// include whatever this turn extracted.
pub fn next_step(current: IntakeStep, fields: &LeadFields, utterance: &str) -> IntakeStep {
    let advance = match current {
        IntakeStep::Greeting => matches!(
            classify_intent(utterance),
            Intent::ProjectInquiry | Intent::ServiceInquiry
        ),
        IntakeStep::InfoCollection => fields.has_basic_info(),
        IntakeStep::ProjectDetails => fields.has_project_info(),
        IntakeStep::ContactReady => false,
    };

    if advance {
        current.next().unwrap_or(current)
    } else {
        current
    }
}

/// State of one chat session. Lives as long as the widget session; not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub step: IntakeStep,
    pub fields: LeadFields,
    /// Raw user utterances, oldest first.
    pub history: Vec<String>,
    /// Intent of the latest utterance.
    pub intent: Intent,
    pub turns: u32,
    pub started_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            step: IntakeStep::default(),
            fields: LeadFields::default(),
            history: Vec::new(),
            intent: Intent::default(),
            turns: 0,
            started_at: now,
            last_active: now,
        }
    }

    /// Append a user utterance to the history.
    pub fn record_utterance(&mut self, utterance: &str) {
        self.history.push(utterance.to_string());
        self.turns += 1;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// How long the session has been idle.
    pub fn idle_for(&self, now: DateTime<Utc>) -> std::time::Duration {
        (now - self.last_active).to_std().unwrap_or_default()
    }
}
