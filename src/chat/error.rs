//! Error taxonomy for the chat pipeline.
//!
//! Validation failures never reach the network; the two stream variants
//! are distinguished by whether any fragment was delivered first.

/// Errors surfaced by the chat pipeline
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Malformed request, rejected before any upstream call
    #[error("invalid request: {field}: {message}")]
    Validation { field: String, message: String },

    /// Generation endpoint unreachable or rejected the call before
    /// streaming began; zero fragments were delivered
    #[error("generation endpoint unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Stream dropped after partial output; fragments already delivered
    /// stand, and callers must treat the truncation as terminal
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl ChatError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for failures the caller could meaningfully retry against the
    /// upstream; validation failures are not retryable as-is
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable(_) | Self::StreamInterrupted(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_field() {
        let err = ChatError::validation("monthlyIncome", "must be non-negative");
        assert_eq!(
            err.to_string(),
            "invalid request: monthlyIncome: must be non-negative"
        );
    }

    #[test]
    fn test_upstream_classification() {
        assert!(ChatError::UpstreamUnavailable("quota".into()).is_upstream());
        assert!(ChatError::StreamInterrupted("reset".into()).is_upstream());
        assert!(!ChatError::validation("messages", "empty").is_upstream());
    }
}
