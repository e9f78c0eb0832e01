//! OpenAI-specific error handling.

use curator_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials or missing permission.
    AuthenticationError,
    /// Rate limit or quota exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// The request was rejected as malformed.
    InvalidRequest,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (403, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (400, _) | (422, _) => Self::InvalidRequest,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Rate limits are not: continuing would only burn quota.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerError)
    }
}

/// Convert an OpenAI error to a curator [`Error`].
pub fn to_curator_error(code: OpenAIErrorCode, message: &str) -> Error {
    match code {
        OpenAIErrorCode::AuthenticationError => {
            Error::Unauthorized(format!("Authentication failed: {}", message))
        }
        OpenAIErrorCode::RateLimitExceeded => {
            Error::RateLimited(format!("Rate limit exceeded: {}", message))
        }
        OpenAIErrorCode::ModelNotFound => Error::Config(format!("Model not found: {}", message)),
        OpenAIErrorCode::ContextLengthExceeded => {
            Error::InvalidRequest(format!("Context too long: {}", message))
        }
        OpenAIErrorCode::InvalidRequest => Error::InvalidRequest(message.to_string()),
        OpenAIErrorCode::ServerError => {
            Error::ServiceUnavailable(format!("Server error: {}", message))
        }
        OpenAIErrorCode::Unknown => Error::Inference(message.to_string()),
    }
}
