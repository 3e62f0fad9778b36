//! Collaborator interfaces for the external session and role stores.
//!
//! Both stores are injected into the gate as `Arc<dyn _>` handles, built once
//! at startup. Nothing in this crate reaches for a global client.

use async_trait::async_trait;
use tatame_core::Result;

use crate::error::{AuthenticationError, AuthorizationError};
use crate::role::Role;
use crate::session::{CookieMutation, Identity, SessionCookies, SessionValidation, SignInOutcome};

/// The managed authentication service holding sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Validates the session carried by `cookies`, refreshing it if needed.
    ///
    /// An absent, expired or revoked session is `Ok` with no identity. `Err`
    /// is reserved for "could not tell", which callers must treat as no
    /// identity.
    async fn validate_and_maybe_refresh(
        &self,
        cookies: &SessionCookies,
    ) -> Result<SessionValidation, AuthenticationError>;

    /// Exchanges an email and password for a new session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
        cookies: &SessionCookies,
    ) -> Result<SignInOutcome, AuthenticationError>;

    /// Revokes the session carried by `cookies` at the store.
    async fn revoke(&self, cookies: &SessionCookies) -> Result<(), AuthenticationError>;

    /// Returns removals for every session cookie present in `cookies`.
    fn clear_session(&self, cookies: &SessionCookies) -> Vec<CookieMutation>;
}

/// The relational table mapping identities to role strings.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Returns the stored role for `identity`, or `None` if there is no row.
    async fn get_role(&self, identity: &Identity) -> Result<Option<Role>, AuthorizationError>;
}
