//! [`SessionStore`] backed by the hosted authentication service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tatame_core::Result;
use tatame_access::{
    AccessToken, AuthenticationError, CookieMutation, CookieOptions, Identity, SessionCookies,
    SessionStore, SessionValidation, SignInOutcome,
};
use tracing::{debug, instrument, warn};

use crate::client::{AuthUser, BackendClient, TokenResponse};
use crate::config::BackendConfig;
use crate::cookie::{SessionCookieCodec, StoredSession};

/// Session store persisting the token pair in the session cookie family.
#[derive(Clone)]
pub struct BackendSessionStore {
    client: BackendClient,
    codec: SessionCookieCodec,
    refresh_margin_seconds: i64,
}

impl BackendSessionStore {
    #[must_use]
    pub fn new(client: BackendClient, codec: SessionCookieCodec, refresh_margin_seconds: i64) -> Self {
        Self {
            client,
            codec,
            refresh_margin_seconds,
        }
    }

    /// Builds a store using the cookie name and refresh margin from `config`.
    #[must_use]
    pub fn from_config(client: BackendClient, config: &BackendConfig, options: CookieOptions) -> Self {
        Self::new(
            client,
            SessionCookieCodec::new(config.cookie_name.clone(), options),
            config.refresh_margin_seconds,
        )
    }

    #[must_use]
    pub fn codec(&self) -> &SessionCookieCodec {
        &self.codec
    }

    fn stored(tokens: &TokenResponse, now: DateTime<Utc>) -> StoredSession {
        StoredSession {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: tokens
                .expires_at
                .unwrap_or_else(|| now.timestamp().saturating_add(tokens.expires_in)),
        }
    }

    fn identity(user: AuthUser, access_token: &str) -> Identity {
        Identity::new(user.id, user.email).with_access_token(AccessToken::new(access_token))
    }

    fn signed_out(&self, cookies: &SessionCookies) -> SessionValidation {
        SessionValidation::anonymous().with_mutations(self.codec.clear(cookies))
    }
}

#[async_trait]
impl SessionStore for BackendSessionStore {
    #[instrument(skip_all)]
    async fn validate_and_maybe_refresh(
        &self,
        cookies: &SessionCookies,
    ) -> Result<SessionValidation, AuthenticationError> {
        let stored = match self.codec.read(cookies) {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(SessionValidation::anonymous()),
            Err(report) => {
                warn!(error = %report, "discarding unreadable session cookie");
                return Ok(self.signed_out(cookies));
            }
        };

        let now = Utc::now();
        if stored.expires_within(self.refresh_margin_seconds, now) {
            let Some(tokens) = self.client.refresh_session(&stored.refresh_token).await? else {
                debug!("refresh token rejected, clearing session");
                return Ok(self.signed_out(cookies));
            };

            // A freshly issued pair carries its user; no second round trip.
            let refreshed = Self::stored(&tokens, now);
            let mutations = self.codec.write(&refreshed, cookies)?;
            debug!(user_id = %tokens.user.id, "session refreshed");
            let identity = Self::identity(tokens.user, &refreshed.access_token);
            return Ok(SessionValidation::authenticated(identity).with_mutations(mutations));
        }

        match self.client.fetch_user(&stored.access_token).await? {
            Some(user) => Ok(SessionValidation::authenticated(Self::identity(
                user,
                &stored.access_token,
            ))),
            None => {
                debug!("access token rejected, clearing session");
                Ok(self.signed_out(cookies))
            }
        }
    }

    #[instrument(skip(self, password, cookies))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
        cookies: &SessionCookies,
    ) -> Result<SignInOutcome, AuthenticationError> {
        let Some(tokens) = self.client.password_grant(email, password).await? else {
            return Ok(SignInOutcome::Rejected);
        };

        let stored = Self::stored(&tokens, Utc::now());
        let cookie_mutations = self.codec.write(&stored, cookies)?;
        Ok(SignInOutcome::Authenticated {
            identity: Self::identity(tokens.user, &stored.access_token),
            cookie_mutations,
        })
    }

    #[instrument(skip_all)]
    async fn revoke(&self, cookies: &SessionCookies) -> Result<(), AuthenticationError> {
        match self.codec.read(cookies) {
            Ok(Some(stored)) => self.client.logout(&stored.access_token).await,
            Ok(None) => Ok(()),
            Err(report) => {
                debug!(error = %report, "nothing to revoke");
                Ok(())
            }
        }
    }

    fn clear_session(&self, cookies: &SessionCookies) -> Vec<CookieMutation> {
        self.codec.clear(cookies)
    }
}
