//! Error types for the Casha presentation-state layer

use thiserror::Error;

/// Result type alias for collaborator and state operations
pub type Result<T> = std::result::Result<T, CashaError>;

#[derive(Error, Debug)]
pub enum CashaError {

    // =============================
    // Local / Collaborator Errors
    // =============================

    /// Failure reported by a use-case with a message meant for the user.
    #[error("{0}")]
    Remote(String),

    /// Failure without any usable message.
    #[error("Request failed")]
    Unavailable,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State container closed")]
    StateClosed,

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CashaError {
    /// Message suitable for direct display, if the failure carries one.
    pub fn user_message(&self) -> Option<String> {
        match self {
            CashaError::Remote(msg) => {
                let trimmed = msg.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CashaError::Unavailable => None,
            other => Some(other.to_string()),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        CashaError::Remote(message.into())
    }
}

/// Resolve the text shown for a failed action: the failure's own message, or
/// the action-specific fallback.
pub fn failure_message(err: &CashaError, fallback: &str) -> String {
    err.user_message().unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_message_is_used() {
        let err = CashaError::remote("Invalid credentials");
        assert_eq!(failure_message(&err, "Login failed"), "Invalid credentials");
    }

    #[test]
    fn test_fallback_when_message_missing() {
        assert_eq!(
            failure_message(&CashaError::Unavailable, "Login failed"),
            "Login failed"
        );
        assert_eq!(
            failure_message(&CashaError::remote("   "), "Failed to fetch goals"),
            "Failed to fetch goals"
        );
    }

    #[test]
    fn test_not_found_renders_with_prefix() {
        let err = CashaError::NotFound("asset a-1".to_string());
        assert_eq!(err.user_message().as_deref(), Some("Not found: asset a-1"));
    }
}
