//! Lead intake: the sales chatbot's conversation engine.
//!
//! A chat session walks through four steps (greeting, contact details,
//! project details, ready to hand off). Each user message is classified by
//! intent, mined for contact fields with ordered pattern rules, and answered
//! either by the completion proxy or by canned copy when that call fails.

pub mod canned;
pub mod engine;
pub mod model;
pub mod prompts;
pub mod routes;
pub mod rules;
pub mod session;
pub mod state;

pub use canned::quick_actions;
pub use engine::{IntakeEngine, Reply, ReplySource, TurnOutcome};
pub use model::{Intent, LeadField, LeadFields, LeadRecord, QuickAction};
pub use routes::{IntakeRouteState, intake_routes};
pub use rules::{classify_intent, extract_brief, extract_fields};
pub use session::{SessionStore, spawn_prune_task};
pub use state::{ConversationState, IntakeStep, next_step};
