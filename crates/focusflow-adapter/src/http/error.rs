/*
[INPUT]:  Error sources (HTTP transport, API status codes, serialization, URLs)
[OUTPUT]: Structured error types with retry and not-found hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Focusflow adapter
#[derive(Error, Debug)]
pub enum FocusflowError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Requested resource does not exist (or has expired)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Access token missing, invalid or rejected
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    /// Connection timeout
    #[error("Connection timeout after {duration}s")]
    Timeout { duration: u64 },
}

impl FocusflowError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FocusflowError::Http(_)
                | FocusflowError::RateLimit { .. }
                | FocusflowError::Timeout { .. }
                | FocusflowError::InvalidResponse(_)
        )
    }

    /// Get retry delay in seconds (if retryable)
    pub fn retry_delay(&self) -> Option<u64> {
        match self {
            FocusflowError::RateLimit { retry_after } => Some(*retry_after),
            FocusflowError::Timeout { .. } => Some(1),
            _ => None,
        }
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, FocusflowError::Unauthorized { .. })
    }

    /// Check if the server reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        match self {
            FocusflowError::NotFound { .. } => true,
            FocusflowError::Api { code, .. } => *code == 404,
            _ => false,
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        FocusflowError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for Focusflow operations
pub type Result<T> = std::result::Result<T, FocusflowError>;
