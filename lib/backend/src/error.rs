//! Backend error types.

use std::fmt;

/// Errors from row and procedure calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The client could not be built from the configuration.
    Configuration {
        /// Error details.
        details: String,
    },
    /// The backend could not be reached or the call timed out.
    Unavailable {
        /// Error details.
        details: String,
    },
    /// The backend answered with a non-success status.
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, if any.
        message: String,
    },
    /// The response body did not match the expected shape.
    Decode {
        /// Error details.
        details: String,
    },
}

impl BackendError {
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        Self::Unavailable {
            details: err.to_string(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => {
                write!(f, "invalid backend configuration: {}", details)
            }
            Self::Unavailable { details } => {
                write!(f, "backend unavailable: {}", details)
            }
            Self::Rejected { status, message } => {
                write!(f, "backend rejected request with status {}: {}", status, message)
            }
            Self::Decode { details } => {
                write!(f, "failed to decode backend response: {}", details)
            }
        }
    }
}

impl std::error::Error for BackendError {}
