//! Error types for the learnflow crate.
//!
//! External failures are classified by their message text so that the
//! retrying invoker can tell a transient rate limit from a permanent
//! quota denial without knowing which provider produced the error.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The main error type for learnflow operations.
#[derive(Debug, Error)]
pub enum LearnflowError {
    /// The generation capability failed.
    #[error("{0}")]
    Generation(#[from] GenerationError),

    /// The record store failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A student profile was not found.
    #[error("Student profile not found for user: {0}")]
    ProfileNotFound(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a failed external call should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Rate limited with remaining quota; worth retrying after a delay.
    RateLimited,
    /// Rate limited with a zero quota; no attempt can succeed.
    QuotaExhausted,
    /// Anything else; not retried.
    Other,
}

impl ErrorClass {
    /// Classifies an error from its display text.
    ///
    /// Matching is case-insensitive: `429` or `quota` marks a rate limit,
    /// and `limit: 0` on top of that marks the quota as exhausted.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let lowered = message.to_lowercase();
        if !(lowered.contains("429") || lowered.contains("quota")) {
            return Self::Other;
        }
        if lowered.contains("limit: 0") {
            Self::QuotaExhausted
        } else {
            Self::RateLimited
        }
    }

    /// Returns true if a retry may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::QuotaExhausted => write!(f, "quota_exhausted"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Error raised by a generation capability.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GenerationError {
    /// Provider error message.
    pub message: String,
    /// HTTP status, when the failure came from a remote call.
    pub status: Option<u16>,
}

impl GenerationError {
    /// Creates a new generation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Creates an error for an HTTP failure, keeping the status in the message.
    #[must_use]
    pub fn http(status: u16, body: impl AsRef<str>) -> Self {
        Self {
            message: format!("{status} {}", body.as_ref()),
            status: Some(status),
        }
    }

    /// Creates an error for output that does not match the expected structure.
    #[must_use]
    pub fn malformed(kind: impl fmt::Display, detail: impl fmt::Display) -> Self {
        Self::new(format!("Malformed {kind} output: {detail}"))
    }

    /// Returns the classification of this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        ErrorClass::classify(&self.message)
    }
}

/// Errors raised by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed the request.
    #[error("Store backend error: {0}")]
    Backend(String),

    /// A stored record could not be decoded.
    #[error("Store decode error: {0}")]
    Decode(String),

    /// IO error while reading or writing a local store.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Creates a backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit() {
        assert_eq!(
            ErrorClass::classify("429 Too Many Requests"),
            ErrorClass::RateLimited
        );
        assert_eq!(
            ErrorClass::classify("Resource has been exhausted (check QUOTA)"),
            ErrorClass::RateLimited
        );
    }

    #[test]
    fn test_classify_zero_quota() {
        let msg = "429 RESOURCE_EXHAUSTED: Quota exceeded for metric, limit: 0";
        assert_eq!(ErrorClass::classify(msg), ErrorClass::QuotaExhausted);
        assert!(!ErrorClass::classify(msg).is_retryable());
    }

    #[test]
    fn test_limit_zero_without_rate_limit_is_other() {
        assert_eq!(ErrorClass::classify("limit: 0 reached"), ErrorClass::Other);
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(ErrorClass::classify("connection reset"), ErrorClass::Other);
        assert!(!ErrorClass::Other.is_retryable());
    }

    #[test]
    fn test_http_error_keeps_status_in_message() {
        let err = GenerationError::http(429, "quota exceeded");
        assert_eq!(err.status, Some(429));
        assert_eq!(err.class(), ErrorClass::RateLimited);
        assert!(err.to_string().starts_with("429"));
    }

    #[test]
    fn test_error_class_display() {
        assert_eq!(ErrorClass::QuotaExhausted.to_string(), "quota_exhausted");
    }
}
