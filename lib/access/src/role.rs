//! Role values and the staff allow-list.
//!
//! Roles live in the backend's profile table as free-form strings. Only the
//! values in [`STAFF_ROLES`] grant access to the staff area; every caller of
//! the check goes through [`is_staff_role`] so the gate and the per-page
//! checks can never disagree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role values that grant access to the staff area.
pub const STAFF_ROLES: [&str; 3] = ["admin", "teacher", "professor"];

/// Returns true if the role is one of [`STAFF_ROLES`].
///
/// Matching is exact and case-sensitive. A missing role is never staff.
#[must_use]
pub fn is_staff_role(role: Option<&str>) -> bool {
    role.is_some_and(|role| STAFF_ROLES.contains(&role))
}

/// A role string as stored for an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Creates a role from its stored value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the stored value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this role grants staff access.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        is_staff_role(Some(&self.0))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
