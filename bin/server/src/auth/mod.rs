//! Authentication and authorization for the tatame server.
//!
//! This module provides:
//! - The gate middleware evaluating every request
//! - The `RequireStaff` extractor re-checking staff handlers
//! - The `RequireSession` extractor for any signed-in user
//! - Sign-in and sign-out routes backed by the session store
//! - Translation between session-store cookie mutations and HTTP cookies
//!
//! # Authorization Model
//!
//! Sessions live in the hosted backend and travel in cookies. On every
//! request the gate validates (and possibly refreshes) the session; paths
//! under the protected prefix additionally need a staff role read from the
//! backend's `profiles` table. Staff handlers repeat the check through
//! [`RequireStaff`] rather than trusting that the middleware ran.
//!
//! Cookie changes made while an extractor validates the session are queued
//! in [`PendingCookies`] and written by [`gate`], or by
//! [`write_session_cookies`] on routers served without it.
//!
//! Roles are read per request, so a demotion takes effect immediately.

pub mod cookies;
pub mod middleware;
pub mod routes;

use tatame_access::{AccessGate, LoginThrottle};
use tatame_backend::BackendClient;

pub use middleware::{
    AccessRejection, PendingCookies, RequireSession, RequireStaff, gate, write_session_cookies,
};
pub use routes::{login, logout};

/// Shared application state.
pub struct AppState {
    /// Authorization gate over the session and role stores.
    pub gate: AccessGate,
    /// Failed-login limiter.
    pub throttle: LoginThrottle,
    /// Backend client for the academy data.
    pub backend: BackendClient,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(gate: AccessGate, throttle: LoginThrottle, backend: BackendClient) -> Self {
        Self {
            gate,
            throttle,
            backend,
        }
    }
}
