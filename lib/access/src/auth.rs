//! Authenticated staff context handed to protected handlers.

use crate::role::Role;
use crate::session::Identity;
use tatame_core::UserId;

/// A caller that passed the staff check.
///
/// Only [`AccessGate`](crate::AccessGate) constructs this, so holding one
/// means the role was checked against the allow-list.
#[derive(Debug, Clone)]
pub struct AuthenticatedStaff {
    identity: Identity,
    role: Role,
}

impl AuthenticatedStaff {
    pub(crate) fn new(identity: Identity, role: Role) -> Self {
        Self { identity, role }
    }

    /// Returns the staff member's user ID.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        self.identity.id()
    }

    /// Returns the identity, including its bearer token for backend calls.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn role(&self) -> &Role {
        &self.role
    }
}
