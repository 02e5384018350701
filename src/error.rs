//! Error types for the lead intake service.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Completion proxy errors.
///
/// None of these reach the chat user; the intake engine absorbs them into a
/// canned reply.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Completion endpoint is not configured (set {var})")]
    NotConfigured { var: String },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed {
        provider: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl LlmError {
    /// Whether this failure is permanent for the lifetime of the process.
    ///
    /// Transport and payload failures are transient: the next turn tries again.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }
}

/// Errors building a lead record from collected fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeadError {
    #[error("Missing required lead field: {0}")]
    MissingField(&'static str),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} disconnected: {reason}")]
    Disconnected { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
