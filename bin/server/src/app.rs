//! Application router.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::auth::{self, AppState};
use crate::pages;

/// Builds the full router with the gate in front of every route.
///
/// The staff dashboard and API are mounted under the gate's protected prefix.
/// The student area sits outside it and only needs a session.
pub fn router(state: Arc<AppState>) -> Router {
    let policy = state.gate.policy();

    let staff = Router::new()
        .route("/", get(pages::staff_dashboard))
        .nest("/api", api::router());

    Router::new()
        .route("/", get(pages::home_page))
        .route(policy.login_location(), get(pages::login_page))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/student/me", get(api::student_area::my_student_record))
        .nest(policy.protected_prefix(), staff)
        .layer(middleware::from_fn_with_state(state.clone(), auth::gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
