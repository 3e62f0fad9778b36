//! Authorization middleware and extractors for Axum.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};
use tatame_access::{AuthenticatedStaff, CookieMutation, Identity, SessionCookies, StaffCheck};
use tracing::{info, warn};

use super::AppState;
use super::cookies::{replace_request_cookies, request_cookies, response_jar};

/// Cookie changes queued by extractors while a request is handled.
///
/// Installed as a request extension by [`gate`] or
/// [`write_session_cookies`]; whichever installed it writes the queued
/// changes onto the response once the handler returns.
#[derive(Clone, Debug, Default)]
pub struct PendingCookies(Arc<Mutex<Vec<CookieMutation>>>);

impl PendingCookies {
    /// Queues `mutations` after any already queued.
    pub fn push(&self, mutations: Vec<CookieMutation>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(mutations);
    }

    /// Removes and returns everything queued so far.
    pub fn take(&self) -> Vec<CookieMutation> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

fn install_pending(request: &mut Request) -> PendingCookies {
    let pending = PendingCookies::default();
    request.extensions_mut().insert(pending.clone());
    pending
}

/// Gate middleware: evaluates every request before routing.
///
/// Redirects carry the cookie changes from session validation. Requests that
/// pass continue with their `Cookie` header rewritten, so handlers never see
/// a token the store has already rotated, and the response writes the same
/// changes back to the browser, followed by any queued by extractors.
pub async fn gate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let cookies = request_cookies(request.headers());
    let outcome = state.gate.evaluate(&path, &cookies).await;

    if let Some(location) = state.gate.policy().location_for(outcome.decision) {
        let jar = response_jar(&outcome.cookie_mutations);
        return (jar, Redirect::temporary(&location)).into_response();
    }

    if !outcome.cookie_mutations.is_empty() {
        let refreshed = cookies.apply(&outcome.cookie_mutations);
        replace_request_cookies(request.headers_mut(), &refreshed);
    }

    let pending = install_pending(&mut request);
    let response = next.run(request).await;

    let mut mutations = outcome.cookie_mutations;
    mutations.extend(pending.take());
    (response_jar(&mutations), response).into_response()
}

/// Writes cookie changes queued by extractors, for routes served without
/// [`gate`]. A no-op when an outer layer already collects them.
pub async fn write_session_cookies(mut request: Request, next: Next) -> Response {
    if request.extensions().get::<PendingCookies>().is_some() {
        return next.run(request).await;
    }

    let pending = install_pending(&mut request);
    let response = next.run(request).await;
    (response_jar(&pending.take()), response).into_response()
}

/// Hands the session store's cookie changes to the response.
///
/// Later extractors of the same request see the rewritten cookies.
fn queue_mutations(parts: &mut Parts, cookies: &SessionCookies, mutations: Vec<CookieMutation>) {
    if mutations.is_empty() {
        return;
    }
    replace_request_cookies(&mut parts.headers, &cookies.apply(&mutations));
    match parts.extensions.get::<PendingCookies>() {
        Some(pending) => pending.push(mutations),
        None => warn!(
            count = mutations.len(),
            "session cookie changes dropped, no cookie writer installed"
        ),
    }
}

/// Extractor for requiring a staff member.
///
/// Runs the same staff check as the gate. Non-staff callers have their
/// session revoked and cleared before being redirected.
pub struct RequireStaff(pub AuthenticatedStaff);

impl<S> FromRequestParts<S> for RequireStaff
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AccessRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let cookies = request_cookies(&parts.headers);
        let (check, mut mutations) = app_state.gate.check_staff(&cookies).await;
        let policy = app_state.gate.policy();

        match check {
            StaffCheck::Staff(staff) => {
                queue_mutations(parts, &cookies, mutations);
                Ok(RequireStaff(staff))
            }
            StaffCheck::Unauthenticated => Err(AccessRejection::Unauthenticated {
                location: policy.login_location().to_string(),
                cookie_mutations: mutations,
            }),
            StaffCheck::Forbidden(identity) => {
                info!(user_id = %identity.id(), "signing out non-staff caller");
                let current = cookies.apply(&mutations);
                let sessions = app_state.gate.sessions();
                if let Err(report) = sessions.revoke(&current).await {
                    warn!(error = %report, "failed to revoke session of non-staff caller");
                }
                mutations.extend(sessions.clear_session(&current));
                Err(AccessRejection::Forbidden {
                    location: policy.forbidden_location(),
                    cookie_mutations: mutations,
                })
            }
        }
    }
}

/// Extractor for any signed-in user, staff or not.
pub struct RequireSession(pub Identity);

impl<S> FromRequestParts<S> for RequireSession
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AccessRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let cookies = request_cookies(&parts.headers);
        let validation = app_state.gate.authenticate(&cookies).await;

        match validation.identity {
            Some(identity) => {
                queue_mutations(parts, &cookies, validation.cookie_mutations);
                Ok(RequireSession(identity))
            }
            None => Err(AccessRejection::SignedOut {
                cookie_mutations: validation.cookie_mutations,
            }),
        }
    }
}

/// Rejection type for [`RequireStaff`] and [`RequireSession`].
#[derive(Debug)]
pub enum AccessRejection {
    /// No valid session on a staff route.
    Unauthenticated {
        location: String,
        cookie_mutations: Vec<CookieMutation>,
    },
    /// Valid session without a staff role.
    Forbidden {
        location: String,
        cookie_mutations: Vec<CookieMutation>,
    },
    /// No valid session on a JSON endpoint.
    SignedOut { cookie_mutations: Vec<CookieMutation> },
}

impl IntoResponse for AccessRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated {
                location,
                cookie_mutations,
            }
            | Self::Forbidden {
                location,
                cookie_mutations,
            } => (response_jar(&cookie_mutations), Redirect::temporary(&location)).into_response(),
            Self::SignedOut { cookie_mutations } => (
                StatusCode::UNAUTHORIZED,
                response_jar(&cookie_mutations),
                Json(json!({ "error": "Sign in required." })),
            )
                .into_response(),
        }
    }
}
