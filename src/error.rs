//! Error types for the dashboard.
//!
//! Three families, matching how each is recovered:
//!
//! - [`ApiError`]: transport failures. Recovered per poll cycle, never fatal.
//! - [`ValidationError`]: rejected user input. The operation is aborted and
//!   the model is left unchanged.
//! - [`PolicyError`]: outcome of a policy edit, wrapping the two above plus
//!   the optimistic-persist failure case.

use thiserror::Error;

/// Errors that can occur when talking to the governor server.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Server answered with a non-success status.
    #[error("server returned status {code}")]
    Status { code: u16 },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Server reported an error inside an otherwise valid body.
    #[error("server error: {0}")]
    Remote(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Connection(err.to_string())
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                code: status.as_u16(),
            }
        } else {
            ApiError::Http(err.to_string())
        }
    }
}

/// User input rejected before anything is sent to the server.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("URL must not be empty")]
    EmptyUrl,

    #[error("'{url}' is not a valid URL: {reason}")]
    MalformedUrl { url: String, reason: String },

    #[error("URL already present: {0}")]
    DuplicateUrl(String),

    #[error("no URL at index {index} (list has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("quota must be greater than zero")]
    NonPositiveQuota,

    #[error("quota minimum {min} GB exceeds maximum {max} GB")]
    QuotaRange { min: f64, max: f64 },

    #[error("speed limit must be greater than zero")]
    NonPositiveSpeed,

    #[error("sleep minimum {min} min exceeds maximum {max} min")]
    SleepRange { min: f64, max: f64 },

    #[error("'{0}' is not a HH:MM time")]
    InvalidTime(String),

    #[error("{field}: '{value}' is not a number")]
    InvalidNumber { field: &'static str, value: String },

    #[error("unknown interface: {0}")]
    UnknownInterface(String),

    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
}

/// Outcome of a failed policy edit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// Input rejected, nothing changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Remote call failed before anything changed locally.
    #[error(transparent)]
    Transport(#[from] ApiError),

    /// The local model was changed but the server did not accept it.
    /// The local change is kept until the next successful load or save.
    #[error("change kept locally but not saved: {source}")]
    PersistFailed { source: ApiError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_error_messages() {
        let err = PolicyError::from(ValidationError::DuplicateUrl("https://x.test".into()));
        assert_eq!(err.to_string(), "URL already present: https://x.test");

        let err = PolicyError::PersistFailed {
            source: ApiError::Status { code: 500 },
        };
        assert_eq!(
            err.to_string(),
            "change kept locally but not saved: server returned status 500"
        );
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(ApiError::Timeout.to_string(), "Request timed out");
        assert_eq!(
            ApiError::Remote("Interface eth9 not found".into()).to_string(),
            "server error: Interface eth9 not found"
        );
    }
}
