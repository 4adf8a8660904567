//! Error types for talking to the portal.

use thiserror::Error;

/// Errors that can occur while fetching a portal page.
#[derive(Debug, Error, Clone)]
pub enum FetchError {
    /// The request did not complete within the configured timeout
    #[error("Request timed out: {message}")]
    Timeout { message: String },

    /// Connection or transport failure
    #[error("Network error: {message}")]
    Network { message: String },

    /// The portal answered with a non-success status
    #[error("Portal returned HTTP {code}")]
    Status { code: u16 },

    /// The response did not carry the ASP.NET form state needed for the next postback
    #[error("Missing form state field: {field}")]
    MissingFormState { field: String },

    /// The response could not be interpreted
    #[error("Parse error: {message}")]
    Parse { message: String },
}

impl FetchError {
    /// Returns true if this error is potentially transient and retryable.
    ///
    /// Timeouts, transport failures, 429 and 5xx responses are retried;
    /// everything else means the request itself is wrong.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Network { .. } => true,
            FetchError::Status { code } => *code == 429 || (500..600).contains(code),
            FetchError::MissingFormState { .. } | FetchError::Parse { .. } => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                code: status.as_u16(),
            }
        } else {
            FetchError::Network {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::Timeout { message: "t".into() }.is_retryable());
        assert!(FetchError::Network { message: "n".into() }.is_retryable());
        assert!(FetchError::Status { code: 503 }.is_retryable());
        assert!(FetchError::Status { code: 429 }.is_retryable());

        assert!(!FetchError::Status { code: 404 }.is_retryable());
        assert!(!FetchError::MissingFormState { field: "__VIEWSTATE".into() }.is_retryable());
        assert!(!FetchError::Parse { message: "p".into() }.is_retryable());
    }
}
