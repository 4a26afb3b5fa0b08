//! Error types for configuration and the live connection.

use serde::Serialize;

/// Failure while reading [`crate::PresenceConfig`] from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("backend url must start with http, https, ws or wss: {0}")]
    InvalidBackendUrl(String),
    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

/// Connection-level error surfaced through the client's `last_error`.
///
/// Construction-class errors ([`Self::InvalidBackendUrl`],
/// [`Self::InvalidUrl`], [`Self::Config`]) are never retried. [`Self::Unreachable`] counts as an
/// unsolicited close and goes through the bounded retry path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum PresenceError {
    #[error("invalid backend url: {0}")]
    InvalidBackendUrl(String),
    #[error("invalid websocket url: {0}")]
    InvalidUrl(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("realtime server unreachable: {0}")]
    Unreachable(String),
    #[error("websocket error: {0}")]
    Socket(String),
    #[error("failed to encode outbound frame: {0}")]
    Protocol(String),
}

impl PresenceError {
    /// Whether a failed open with this error should consume a retry slot.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Socket(_))
    }
}

impl From<ConfigError> for PresenceError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::InvalidBackendUrl(url) => Self::InvalidBackendUrl(url),
            other @ ConfigError::InvalidVar { .. } => Self::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
