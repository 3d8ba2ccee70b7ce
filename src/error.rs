//! Unified error handling for the runmate client core.
//!
//! Every fallible operation in the crate returns [`Result`]. The controllers
//! translate most of these into state (retained markers, cleared selection)
//! instead of passing them up; see `search.rs`.

use thiserror::Error;

/// Unified error type for runmate operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunmateError {
    /// Bounding box with non-finite or inverted coordinates
    #[error("Invalid bounds: {message}")]
    InvalidBounds { message: String },

    /// HTTP/API error
    #[error("{}", http_message(.message, .status_code))]
    Http {
        message: String,
        status_code: Option<u16>,
    },

    /// Backend answered 401; the host should route to the login screen
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// A requested record does not exist
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: i64 },

    /// Response body could not be decoded
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request rejected before reaching the backend
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Position lookup failed or is unsupported
    #[error("Geolocation error: {message}")]
    Geolocation { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn http_message(message: &str, status_code: &Option<u16>) -> String {
    match status_code {
        Some(code) => format!("HTTP error ({}): {}", code, message),
        None => format!("HTTP error: {}", message),
    }
}

impl RunmateError {
    pub(crate) fn http(message: impl Into<String>, status_code: Option<u16>) -> Self {
        RunmateError::Http {
            message: message.into(),
            status_code,
        }
    }

    pub(crate) fn not_found(resource: &str, id: i64) -> Self {
        RunmateError::NotFound {
            resource: resource.to_string(),
            id,
        }
    }

    /// True when the backend rejected the caller's credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, RunmateError::Unauthorized { .. })
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for RunmateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RunmateError::Decode {
                message: e.to_string(),
            }
        } else {
            RunmateError::http(e.to_string(), e.status().map(|s| s.as_u16()))
        }
    }
}

impl From<serde_json::Error> for RunmateError {
    fn from(e: serde_json::Error) -> Self {
        RunmateError::Decode {
            message: e.to_string(),
        }
    }
}

/// Result type alias for runmate operations.
pub type Result<T> = std::result::Result<T, RunmateError>;

/// Extension trait for converting Option to RunmateError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a not-found error for `resource`/`id`.
    fn ok_or_not_found(self, resource: &str, id: i64) -> Result<T>;

    /// Convert Option to Result with generic internal error.
    fn ok_or_internal(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, resource: &str, id: i64) -> Result<T> {
        self.ok_or_else(|| RunmateError::not_found(resource, id))
    }

    fn ok_or_internal(self, message: &str) -> Result<T> {
        self.ok_or_else(|| RunmateError::Internal {
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RunmateError::http("Bad Gateway", Some(502));
        assert_eq!(err.to_string(), "HTTP error (502): Bad Gateway");

        let err = RunmateError::http("connection reset", None);
        assert_eq!(err.to_string(), "HTTP error: connection reset");

        let err = RunmateError::not_found("Session summary", 7);
        assert_eq!(err.to_string(), "Session summary 7 not found");
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_not_found("Session", 3);
        assert!(matches!(result, Err(RunmateError::NotFound { id: 3, .. })));

        let some = Some(5).ok_or_internal("unreachable");
        assert_eq!(some, Ok(5));
    }

    #[test]
    fn test_auth_failure() {
        let err = RunmateError::Unauthorized {
            message: "Login required".to_string(),
        };
        assert!(err.is_auth_failure());
        assert!(!RunmateError::http("x", Some(500)).is_auth_failure());
    }
}
