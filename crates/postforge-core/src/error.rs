//! Unified error types for Postforge.

use thiserror::Error;

use crate::types::PostState;

/// Result type alias using PostforgeError.
pub type Result<T> = std::result::Result<T, PostforgeError>;

#[derive(Error, Debug)]
pub enum PostforgeError {
    // Schedule configuration
    #[error("Schedule configuration corrupt: {0}")]
    ConfigCorrupt(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Per-record pipeline failures
    #[error("Content generation failed: {0}")]
    Generation(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    // Concurrency race on a guarded transition — the record moved under us.
    #[error("Stale state for post {id}: expected {expected}, found {actual}")]
    StaleState {
        id: String,
        expected: PostState,
        actual: PostState,
    },

    // Store errors
    #[error("Post record not found: {0}")]
    RecordNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    // External service plumbing
    #[error("API key not configured: {0}")]
    ApiKeyMissing(String),

    #[error("HTTP error: {0}")]
    Http(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl PostforgeError {
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostforgeError::Generation("model unavailable".into());
        assert!(err.to_string().contains("model unavailable"));
    }

    #[test]
    fn test_error_constructors() {
        let e1 = PostforgeError::generation("test");
        assert!(matches!(e1, PostforgeError::Generation(_)));

        let e2 = PostforgeError::publish("test");
        assert!(matches!(e2, PostforgeError::Publish(_)));

        let e3 = PostforgeError::store("test");
        assert!(matches!(e3, PostforgeError::Store(_)));

        let e4 = PostforgeError::invalid_config("test");
        assert!(matches!(e4, PostforgeError::InvalidConfig(_)));
    }

    #[test]
    fn test_stale_state_display() {
        let err = PostforgeError::StaleState {
            id: "abc".into(),
            expected: PostState::Pending,
            actual: PostState::Generating,
        };
        let msg = err.to_string();
        assert!(msg.contains("abc"));
        assert!(msg.contains("pending"));
        assert!(msg.contains("generating"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PostforgeError = io_err.into();
        assert!(matches!(err, PostforgeError::Io(_)));
    }
}
