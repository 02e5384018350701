//! IntakeEngine runs one conversation turn: intent, extraction, step
//! transition and the reply.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{CompanyProfile, IntakeConfig};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

use super::canned::{contextual_response, greeting, is_unhelpful_reply, step_fallback};
use super::model::{Intent, LeadFields, LeadRecord};
use super::prompts::build_system_prompt;
use super::rules::{classify_intent, extract_brief, extract_fields};
use super::state::{ConversationState, IntakeStep, next_step};

/// Which path produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Remote,
    Contextual,
    StepFallback,
}

impl std::fmt::Display for ReplySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Contextual => write!(f, "contextual"),
            Self::StepFallback => write!(f, "step_fallback"),
        }
    }
}

/// An assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

/// Everything the UI needs after a turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub source: ReplySource,
    pub step: IntakeStep,
    pub step_changed: bool,
    pub intent: Intent,
    /// Fields this turn added.
    pub newly_extracted: LeadFields,
    /// The user is volunteering details, or the step still needs some.
    pub should_collect_info: bool,
    /// The conversation is complete and a lead record can be built.
    pub lead_ready: bool,
}

/// Phrases that signal the user is handing over details.
const INFO_PHRASES: &[&str] = &[
    "my name is",
    "i am",
    "email is",
    "company is",
    "phone is",
    "budget is",
];

/// Sampling settings for the reply call.
#[derive(Debug, Clone, Copy)]
struct Sampling {
    max_tokens: u32,
    temperature: f32,
}

/// Runs conversation turns against a completion provider.
///
/// Holds no per-session data; callers own the [`ConversationState`].
pub struct IntakeEngine {
    llm: Arc<dyn LlmProvider>,
    company: CompanyProfile,
    sampling: Sampling,
}

impl IntakeEngine {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &IntakeConfig) -> Self {
        Self {
            llm,
            company: config.company.clone(),
            sampling: Sampling {
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            },
        }
    }

    pub fn company(&self) -> &CompanyProfile {
        &self.company
    }

    /// Whether a completion endpoint is available at all.
    pub fn has_remote(&self) -> bool {
        self.llm.is_configured()
    }

    /// Opening message for a new session.
    pub fn greeting(&self) -> String {
        greeting(&self.company)
    }

    /// Replace the session with a fresh one ("Start over").
    pub fn reset(&self, state: &mut ConversationState) {
        *state = ConversationState::new();
    }

    /// Process one user utterance.
    ///
    /// The step transition depends only on the utterance and the collected
    /// fields, so it happens even when the completion call fails.
    ///
    /// The caller must not run two turns for the same state concurrently; the
    /// `&mut` borrow enforces that within a task.
    pub async fn process_turn(
        &self,
        state: &mut ConversationState,
        utterance: &str,
    ) -> TurnOutcome {
        state.record_utterance(utterance);
        state.intent = classify_intent(utterance);

        let mut extracted = extract_fields(utterance, &state.fields);
        if let Some(brief) = extract_brief(utterance, state.step, &state.fields) {
            extracted.description = Some(brief);
        }
        state.fields.merge(extracted.clone());

        let previous = state.step;
        state.step = next_step(previous, &state.fields, utterance);
        let step_changed = state.step != previous;
        if step_changed {
            info!(from = %previous, to = %state.step, "Intake step advanced");
        }

        let reply = self.generate_reply(utterance, state).await;

        let should_collect_info = wants_info(utterance, state);
        let lead_ready = state.step == IntakeStep::ContactReady
            && LeadRecord::try_from(&state.fields).is_ok();

        info!(
            step = %state.step,
            intent = %state.intent,
            source = %reply.source,
            extracted = extracted.set_fields().len(),
            "Intake turn processed"
        );

        TurnOutcome {
            reply: reply.text,
            source: reply.source,
            step: state.step,
            step_changed,
            intent: state.intent,
            newly_extracted: extracted,
            should_collect_info,
            lead_ready,
        }
    }

    /// Produce a reply for the current state. Never fails.
    ///
    /// One completion attempt, no retry. Failures fall back to the step's canned
    /// reply; an empty or parroted answer tries a keyword-matched reply first.
    pub async fn generate_reply(&self, utterance: &str, state: &ConversationState) -> Reply {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_system_prompt(&self.company, state)),
            ChatMessage::user(utterance),
        ])
        .with_max_tokens(self.sampling.max_tokens)
        .with_temperature(self.sampling.temperature);

        match self.llm.complete(request).await {
            Ok(response) => {
                let content = response.content.as_deref();
                if !is_unhelpful_reply(content, &self.company) {
                    return Reply {
                        text: content.unwrap_or_default().trim().to_string(),
                        source: ReplySource::Remote,
                    };
                }
                debug!(
                    finish_reason = ?response.finish_reason,
                    "Completion reply was empty or canned; using keyword reply"
                );
                match contextual_response(utterance, &self.company) {
                    Some(text) => Reply {
                        text,
                        source: ReplySource::Contextual,
                    },
                    None => self.fallback(state.step),
                }
            }
            Err(e) if e.is_permanent() => {
                debug!("Completion unavailable: {}", e);
                self.fallback(state.step)
            }
            Err(e) => {
                warn!(step = %state.step, "Completion call failed: {}", e);
                self.fallback(state.step)
            }
        }
    }

    fn fallback(&self, step: IntakeStep) -> Reply {
        Reply {
            text: step_fallback(step, &self.company),
            source: ReplySource::StepFallback,
        }
    }

    /// Send a minimal request and report whether the proxy answered.
    pub async fn check_connection(&self) -> bool {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("You are a minimal tester."),
            ChatMessage::user("Ping"),
        ])
        .with_max_tokens(10)
        .with_temperature(0.0);

        match self.llm.complete(request).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Completion proxy check failed: {}", e);
                false
            }
        }
    }
}

fn wants_info(utterance: &str, state: &ConversationState) -> bool {
    let lower = utterance.to_lowercase();
    let volunteering = INFO_PHRASES.iter().any(|p| lower.contains(p));
    let needs_basic = state.step == IntakeStep::InfoCollection && !state.fields.has_basic_info();
    let needs_project =
        state.step == IntakeStep::ProjectDetails && !state.fields.has_project_info();
    volunteering || needs_basic || needs_project
}
