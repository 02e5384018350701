//! LLM integration for the intake assistant.
//!
//! One backend: an HTTP proxy that accepts chat-completions requests and
//! forwards them to the hosted model. The [`LlmProvider`] trait is the seam
//! tests use to substitute scripted replies.

pub mod provider;
pub mod proxy;

pub use provider::*;
pub use proxy::ProxyProvider;

use std::sync::Arc;

use crate::config::IntakeConfig;
use crate::error::LlmError;

/// Create the completion provider from configuration.
pub fn create_provider(config: &IntakeConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = ProxyProvider::new(config)?;
    if let Some(endpoint) = provider.endpoint() {
        tracing::info!("Using completion proxy {} (model: {})", endpoint, config.model);
    }
    Ok(Arc::new(provider))
}
