//! Error types.
//!
//! `AppError` is what the binary surfaces (exit code + message). Dataset
//! loads never produce one: a failed fetch is described by `FailureReason`
//! and degrades to the fallback table instead.

use thiserror::Error;

#[derive(Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Configuration or argument problem.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Reading or writing an artifact failed.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

/// Why a remote source was replaced by its fallback table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// Connection failure, DNS failure, timeout, or an unreadable body.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status code.
    #[error("status {0}")]
    Status(u16),

    /// The body arrived but did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_displays_message_only() {
        let err = AppError::config("bad timeout");
        assert_eq!(err.to_string(), "bad timeout");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn failure_reason_messages() {
        assert_eq!(FailureReason::Status(500).to_string(), "status 500");
        assert!(
            FailureReason::Shape("missing `date`".into())
                .to_string()
                .contains("missing `date`")
        );
    }
}
