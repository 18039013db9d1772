//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport failed (connection refused, DNS, broken pipe)
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Request exceeded the configured timeout and counts as failed
    #[error("Request timed out")]
    Timeout,

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required or session no longer accepted
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected by validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflicting state, e.g. a duplicate favorite
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error reported through the response envelope
    #[error("API error {code}: {message}")]
    Api { code: u16, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot cache could not be read or written
    #[error("Cache error: {0}")]
    Cache(String),
}

impl ClientError {
    /// Transport failures where the server's state is unknown.
    ///
    /// The store keeps its last-known-good collections on these rather
    /// than resetting to empty.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        assert!(ClientError::Timeout.is_unavailable());
        assert!(!ClientError::Unauthorized.is_unavailable());
        assert!(!ClientError::Validation("bad".to_string()).is_unavailable());
        assert!(
            !ClientError::Api {
                code: 9001,
                message: "boom".to_string()
            }
            .is_unavailable()
        );
    }
}
