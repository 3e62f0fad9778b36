//! Per-request authorization gate for the staff area.
//!
//! The gate validates the caller's session on every request, so refreshed
//! session cookies reach the browser even on public pages. Requests under
//! the protected prefix additionally need a staff role. Each request is
//! evaluated on its own; the gate holds no per-request state and can be
//! cloned freely across workers.
//!
//! Any failure or timeout of the session store counts as "no identity" and
//! any failure or timeout of the role store counts as "no role". The gate
//! never lets a request through because a dependency was down.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::auth::AuthenticatedStaff;
use crate::role::Role;
use crate::session::{CookieMutation, Identity, SessionCookies, SessionValidation};
use crate::store::{RoleStore, SessionStore};

/// Query string appended to the login path when a signed-in caller lacks a staff role.
const FORBIDDEN_QUERY: &str = "error=forbidden";

/// Route-space configuration for the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePolicy {
    protected_prefix: String,
    login_path: String,
}

impl GatePolicy {
    #[must_use]
    pub fn new(protected_prefix: impl Into<String>, login_path: impl Into<String>) -> Self {
        Self {
            protected_prefix: protected_prefix.into(),
            login_path: login_path.into(),
        }
    }

    /// Returns true if `path` needs the staff check.
    ///
    /// This is a plain prefix test on the raw path.
    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        path.starts_with(&self.protected_prefix)
    }

    #[must_use]
    pub fn protected_prefix(&self) -> &str {
        &self.protected_prefix
    }

    /// Where unauthenticated callers are sent.
    #[must_use]
    pub fn login_location(&self) -> &str {
        &self.login_path
    }

    /// Where authenticated callers without a staff role are sent.
    #[must_use]
    pub fn forbidden_location(&self) -> String {
        format!("{}?{}", self.login_path, FORBIDDEN_QUERY)
    }

    /// Returns the redirect target for a decision, if it redirects.
    #[must_use]
    pub fn location_for(&self, decision: Decision) -> Option<String> {
        match decision {
            Decision::PassThrough => None,
            Decision::RedirectLogin => Some(self.login_path.clone()),
            Decision::RedirectForbidden => Some(self.forbidden_location()),
        }
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::new("/staff", "/login")
    }
}

/// What the gate decided for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Forward the request to the application.
    PassThrough,
    /// No valid session: send the caller to the login page.
    RedirectLogin,
    /// Valid session without a staff role: send the caller to the login page with the forbidden marker.
    RedirectForbidden,
}

/// Outcome of evaluating one request.
///
/// The cookie mutations come from the session store and must be applied to
/// the response whatever the decision, and to the forwarded request view on
/// pass-through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub decision: Decision,
    pub cookie_mutations: Vec<CookieMutation>,
}

impl GateOutcome {
    fn pass(cookie_mutations: Vec<CookieMutation>) -> Self {
        Self {
            decision: Decision::PassThrough,
            cookie_mutations,
        }
    }
}

/// Result of the staff check used by protected handlers.
#[derive(Debug, Clone)]
pub enum StaffCheck {
    Staff(AuthenticatedStaff),
    Unauthenticated,
    Forbidden(Identity),
}

impl StaffCheck {
    /// Maps the check onto the gate decision it implies.
    #[must_use]
    pub fn decision(&self) -> Decision {
        match self {
            Self::Staff(_) => Decision::PassThrough,
            Self::Unauthenticated => Decision::RedirectLogin,
            Self::Forbidden(_) => Decision::RedirectForbidden,
        }
    }
}

/// The authorization gate.
#[derive(Clone)]
pub struct AccessGate {
    sessions: Arc<dyn SessionStore>,
    roles: Arc<dyn RoleStore>,
    policy: GatePolicy,
    call_timeout: Duration,
}

impl AccessGate {
    /// Creates a gate over the given stores.
    ///
    /// `call_timeout` bounds each store call separately.
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        roles: Arc<dyn RoleStore>,
        policy: GatePolicy,
        call_timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            roles,
            policy,
            call_timeout,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Returns the session store handle, for sign-in and sign-out routes.
    #[must_use]
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Evaluates one request.
    #[instrument(skip(self, cookies))]
    pub async fn evaluate(&self, path: &str, cookies: &SessionCookies) -> GateOutcome {
        let validation = self.resolve_session(cookies).await;

        if !self.policy.is_protected(path) {
            return GateOutcome::pass(validation.cookie_mutations);
        }

        let (check, cookie_mutations) = self.authorize(validation).await;
        let decision = check.decision();
        match &check {
            StaffCheck::Staff(staff) => {
                debug!(user_id = %staff.user_id(), role = %staff.role(), "staff access granted");
            }
            StaffCheck::Unauthenticated => {
                debug!("no session for protected path, redirecting to login");
            }
            StaffCheck::Forbidden(identity) => {
                info!(user_id = %identity.id(), "non-staff caller denied protected path");
            }
        }

        GateOutcome {
            decision,
            cookie_mutations,
        }
    }

    /// Validates the session only, for pages open to any signed-in user.
    ///
    /// Never consults the role store. Store failures and timeouts yield an
    /// anonymous result, as in [`evaluate`](Self::evaluate).
    pub async fn authenticate(&self, cookies: &SessionCookies) -> SessionValidation {
        self.resolve_session(cookies).await
    }

    /// Runs the staff check without the path test.
    ///
    /// Protected handlers call this themselves instead of trusting that the
    /// request went through [`evaluate`](Self::evaluate). It applies the
    /// same allow-list and the same fail-closed rules.
    pub async fn check_staff(&self, cookies: &SessionCookies) -> (StaffCheck, Vec<CookieMutation>) {
        let validation = self.resolve_session(cookies).await;
        self.authorize(validation).await
    }

    async fn authorize(&self, validation: SessionValidation) -> (StaffCheck, Vec<CookieMutation>) {
        let SessionValidation {
            identity,
            cookie_mutations,
        } = validation;

        let Some(identity) = identity else {
            return (StaffCheck::Unauthenticated, cookie_mutations);
        };

        let check = match self.resolve_role(&identity).await {
            Some(role) if role.is_staff() => {
                StaffCheck::Staff(AuthenticatedStaff::new(identity, role))
            }
            _ => StaffCheck::Forbidden(identity),
        };
        (check, cookie_mutations)
    }

    async fn resolve_session(&self, cookies: &SessionCookies) -> SessionValidation {
        match timeout(
            self.call_timeout,
            self.sessions.validate_and_maybe_refresh(cookies),
        )
        .await
        {
            Ok(Ok(validation)) => validation,
            Ok(Err(report)) => {
                warn!(error = %report, "session validation failed, treating caller as anonymous");
                SessionValidation::anonymous()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "session validation timed out, treating caller as anonymous"
                );
                SessionValidation::anonymous()
            }
        }
    }

    async fn resolve_role(&self, identity: &Identity) -> Option<Role> {
        match timeout(self.call_timeout, self.roles.get_role(identity)).await {
            Ok(Ok(role)) => role,
            Ok(Err(report)) => {
                warn!(user_id = %identity.id(), error = %report, "role lookup failed, treating caller as having no role");
                None
            }
            Err(_) => {
                warn!(
                    user_id = %identity.id(),
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "role lookup timed out, treating caller as having no role"
                );
                None
            }
        }
    }
}
