//! Domain error types for server operations.
//!
//! Each error logs its details and answers with a user-safe JSON body of the
//! form `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rootcause::prelude::Report;
use serde_json::json;
use std::fmt;
use tatame_backend::BackendError;

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Sign-in and sign-out errors.
#[derive(Debug)]
pub enum SessionError {
    /// Too many failed attempts from this client.
    Throttled { retry_after_seconds: i64 },
    /// Email or password missing or blank.
    MissingCredentials,
    /// The session store rejected the credentials.
    InvalidCredentials,
    /// The session store could not answer.
    StoreUnavailable { details: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Throttled {
                retry_after_seconds,
            } => write!(f, "login throttled for {} seconds", retry_after_seconds),
            Self::MissingCredentials => write!(f, "email and password are required"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::StoreUnavailable { details } => {
                write!(f, "session store unavailable: {}", details)
            }
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        match &self {
            Self::Throttled {
                retry_after_seconds,
            } => {
                let minutes = (retry_after_seconds + 59) / 60;
                error_response(
                    StatusCode::TOO_MANY_REQUESTS,
                    &format!("Too many attempts. Try again in {} minutes.", minutes.max(1)),
                )
            }
            Self::MissingCredentials => {
                error_response(StatusCode::BAD_REQUEST, "Email and password are required.")
            }
            Self::InvalidCredentials => error_response(
                StatusCode::UNAUTHORIZED,
                "Invalid credentials or login error.",
            ),
            Self::StoreUnavailable { .. } => {
                tracing::error!(error = %self, "sign-in failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
        }
    }
}

/// Student-related errors.
#[derive(Debug)]
pub enum StudentError {
    /// Student was not found.
    NotFound { id: String },
    /// The submitted form is incomplete or invalid.
    InvalidInput { details: String },
    /// Backend error while accessing students.
    Backend { details: String },
}

impl StudentError {
    pub(crate) fn backend(report: Report<BackendError>) -> Self {
        Self::Backend {
            details: report.to_string(),
        }
    }
}

impl fmt::Display for StudentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "student '{}' not found", id),
            Self::InvalidInput { details } => write!(f, "invalid student data: {}", details),
            Self::Backend { details } => write!(f, "student backend error: {}", details),
        }
    }
}

impl IntoResponse for StudentError {
    fn into_response(self) -> Response {
        match &self {
            Self::NotFound { .. } => error_response(StatusCode::NOT_FOUND, "Student not found."),
            Self::InvalidInput { details } => error_response(StatusCode::BAD_REQUEST, details),
            Self::Backend { .. } => {
                tracing::error!(error = %self, "student request failed");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to load or save student data.",
                )
            }
        }
    }
}

/// Student area errors.
#[derive(Debug)]
pub enum StudentAreaError {
    /// The signed-in account's email matches no student record.
    NotLinked,
    /// Backend error while loading the record or its payments.
    Backend { details: String },
}

impl StudentAreaError {
    pub(crate) fn backend(report: Report<BackendError>) -> Self {
        Self::Backend {
            details: report.to_string(),
        }
    }
}

impl fmt::Display for StudentAreaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLinked => write!(f, "account is not linked to a student"),
            Self::Backend { details } => write!(f, "student area backend error: {}", details),
        }
    }
}

impl IntoResponse for StudentAreaError {
    fn into_response(self) -> Response {
        match self {
            Self::NotLinked => error_response(
                StatusCode::NOT_FOUND,
                "Your email is not linked to any registered student.",
            ),
            Self::Backend { .. } => {
                tracing::error!(error = %self, "student area request failed");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to load your student data.",
                )
            }
        }
    }
}

/// Plan and class catalog errors.
#[derive(Debug)]
pub enum CatalogError {
    /// Backend error while listing plans or classes.
    Backend { details: String },
}

impl CatalogError {
    pub(crate) fn backend(report: Report<BackendError>) -> Self {
        Self::Backend {
            details: report.to_string(),
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend { details } => write!(f, "catalog backend error: {}", details),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "catalog request failed");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load plans and classes.",
        )
    }
}

/// Monthly fee errors.
#[derive(Debug)]
pub enum FeeError {
    /// Backend error while listing or toggling fees.
    Backend { details: String },
}

impl FeeError {
    pub(crate) fn backend(report: Report<BackendError>) -> Self {
        Self::Backend {
            details: report.to_string(),
        }
    }
}

impl fmt::Display for FeeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend { details } => write!(f, "fee backend error: {}", details),
        }
    }
}

impl IntoResponse for FeeError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "fee request failed");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load or update monthly fees.",
        )
    }
}

/// Trial class errors.
#[derive(Debug)]
pub enum TrialClassError {
    /// No date and time was given for the class.
    MissingSchedule,
    /// The date and time is not in `YYYY-MM-DDTHH:MM` form.
    InvalidSchedule { value: String },
    /// Name or email missing.
    InvalidInput { details: String },
    /// Backend error while listing or booking trial classes.
    Backend { details: String },
}

impl TrialClassError {
    pub(crate) fn backend(report: Report<BackendError>) -> Self {
        Self::Backend {
            details: report.to_string(),
        }
    }
}

impl fmt::Display for TrialClassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSchedule => write!(f, "trial class schedule is missing"),
            Self::InvalidSchedule { value } => {
                write!(f, "invalid trial class schedule '{}'", value)
            }
            Self::InvalidInput { details } => write!(f, "invalid trial class data: {}", details),
            Self::Backend { details } => write!(f, "trial class backend error: {}", details),
        }
    }
}

impl IntoResponse for TrialClassError {
    fn into_response(self) -> Response {
        match &self {
            Self::MissingSchedule => error_response(
                StatusCode::BAD_REQUEST,
                "Select the date and time of the class.",
            ),
            Self::InvalidSchedule { .. } => error_response(
                StatusCode::BAD_REQUEST,
                "Date and time must be in YYYY-MM-DDTHH:MM format.",
            ),
            Self::InvalidInput { details } => error_response(StatusCode::BAD_REQUEST, details),
            Self::Backend { .. } => {
                tracing::error!(error = %self, "trial class request failed");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to load or book trial classes.",
                )
            }
        }
    }
}
