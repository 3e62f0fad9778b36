//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `AuthenticationError`: session store failures (validation, refresh, sign-in)
//! - `AuthorizationError`: role store failures

use std::fmt;
use tatame_core::UserId;

/// Errors from session store operations.
///
/// These never mean "the credentials were wrong"; a rejected session or
/// password is a normal outcome, not an error. They mean the store could not
/// give an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The session store could not be reached.
    Unavailable { reason: String },
    /// The session store answered with an unexpected status.
    ProviderError { status: u16, reason: String },
    /// The session store answered with a body that could not be decoded.
    MalformedResponse { reason: String },
    /// The session cookie could not be decoded.
    MalformedCookie { name: String, reason: String },
    /// The call did not complete within the configured bound.
    TimedOut { operation: &'static str },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "session store unavailable: {reason}")
            }
            Self::ProviderError { status, reason } => {
                write!(f, "session store returned status {status}: {reason}")
            }
            Self::MalformedResponse { reason } => {
                write!(f, "malformed session store response: {reason}")
            }
            Self::MalformedCookie { name, reason } => {
                write!(f, "malformed session cookie '{name}': {reason}")
            }
            Self::TimedOut { operation } => {
                write!(f, "session store call '{operation}' timed out")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from role store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// The role store could not be reached or rejected the query.
    LookupFailed { reason: String },
    /// More than one role row exists for a single identity.
    AmbiguousRole { user_id: UserId, rows: usize },
    /// The call did not complete within the configured bound.
    TimedOut,
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LookupFailed { reason } => {
                write!(f, "role lookup failed: {reason}")
            }
            Self::AmbiguousRole { user_id, rows } => {
                write!(f, "user {user_id} has {rows} role rows, expected at most one")
            }
            Self::TimedOut => {
                write!(f, "role lookup timed out")
            }
        }
    }
}

impl std::error::Error for AuthorizationError {}
