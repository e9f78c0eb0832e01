//! Error types for the curator pipelines.

use thiserror::Error;

use crate::list_literal::ListLiteralError;
use crate::retry::ErrorClass;

/// Result type alias using curator's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for curator operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Search index operation failed
    #[error("Index error: {0}")]
    Index(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Provider refused the call because of rate or quota limits
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Provider rejected this particular request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream service is temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Text could not be parsed into the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Authentication/authorization failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error for retry and abort decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::RateLimited(_) | Error::Unauthorized(_) | Error::Config(_) => ErrorClass::Fatal,
            Error::ServiceUnavailable(_) | Error::Request(_) => ErrorClass::Retryable,
            _ => ErrorClass::SkipUnit,
        }
    }

    /// Shorthand for `self.class() == ErrorClass::Fatal`.
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl From<ListLiteralError> for Error {
    fn from(e: ListLiteralError) -> Self {
        Error::Parse(e.to_string())
    }
}
