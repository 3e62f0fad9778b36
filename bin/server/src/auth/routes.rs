//! Authentication routes for sign-in and sign-out.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tatame_access::{SignInOutcome, ThrottleStatus};
use tracing::{info, warn};

use super::AppState;
use super::cookies::{request_cookies, response_jar};
use crate::error::SessionError;

/// Throttle key used when the proxy does not forward a client address.
const UNKNOWN_CLIENT: &str = "unknown-ip";

/// Sign-in request body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Identifies the client for throttling: the first `X-Forwarded-For` entry.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Signs in with email and password.
///
/// The throttle is consulted before the body is read, so a locked-out client
/// gets 429 whatever it sends.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, SessionError> {
    let client = client_key(&headers);
    if let ThrottleStatus::Exceeded { retry_after } = state.throttle.check(&client) {
        warn!(client = %client, "login throttled");
        return Err(SessionError::Throttled {
            retry_after_seconds: retry_after.num_seconds(),
        });
    }

    let request: LoginRequest = serde_json::from_slice(&body).unwrap_or_default();
    let (Some(email), Some(password)) = (required(request.email), request.password) else {
        return Err(SessionError::MissingCredentials);
    };
    if password.is_empty() {
        return Err(SessionError::MissingCredentials);
    }

    let cookies = request_cookies(&headers);
    let outcome = state
        .gate
        .sessions()
        .sign_in_with_password(&email, &password, &cookies)
        .await
        .map_err(|report| SessionError::StoreUnavailable {
            details: report.to_string(),
        })?;

    match outcome {
        SignInOutcome::Authenticated {
            identity,
            cookie_mutations,
        } => {
            info!(user_id = %identity.id(), "signed in");
            state.throttle.reset(&client);
            Ok((
                response_jar(&cookie_mutations),
                Json(json!({ "success": true })),
            )
                .into_response())
        }
        SignInOutcome::Rejected => {
            state.throttle.record_failure(&client);
            Err(SessionError::InvalidCredentials)
        }
    }
}

/// Signs out: revokes the session if possible and always clears its cookies.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let cookies = request_cookies(&headers);
    let sessions = state.gate.sessions();

    if let Err(report) = sessions.revoke(&cookies).await {
        warn!(error = %report, "failed to revoke session on logout");
    }

    let removals = sessions.clear_session(&cookies);
    (response_jar(&removals), Json(json!({ "success": true }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_key_uses_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "unknown-ip");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_key(&headers), "203.0.113.7");
    }

    #[test]
    fn login_request_tolerates_missing_fields() {
        let request: LoginRequest = serde_json::from_str(r#"{"email":"a@b.c"}"#).expect("decode");
        assert_eq!(request.email.as_deref(), Some("a@b.c"));
        assert!(request.password.is_none());
    }
}
