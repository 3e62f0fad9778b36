//! Session validation and staff authorization for the tatame back-office.
//!
//! This crate provides:
//! - The staff role allow-list (`STAFF_ROLES`, `is_staff_role`)
//! - The cookie-carried session model (`SessionCookies`, `CookieMutation`)
//! - Collaborator traits for the external stores (`SessionStore`, `RoleStore`)
//! - The per-request authorization gate (`AccessGate`)
//! - A failed-login throttle (`LoginThrottle`)
//!
//! # Access Control Model
//!
//! Every request is evaluated on its own. The session is validated (and
//! possibly refreshed) against the session store; requests under the
//! protected prefix additionally need a role from the allow-list. Any
//! failure of either store denies access.
//!
//! # Example
//!
//! ```
//! use tatame_access::{is_staff_role, GatePolicy};
//!
//! assert!(is_staff_role(Some("teacher")));
//! assert!(!is_staff_role(Some("member")));
//! assert!(!is_staff_role(None));
//!
//! let policy = GatePolicy::new("/staff", "/login");
//! assert!(policy.is_protected("/staff/dashboard"));
//! assert_eq!(policy.forbidden_location(), "/login?error=forbidden");
//! ```

pub mod auth;
pub mod error;
pub mod gate;
pub mod role;
pub mod session;
pub mod store;
pub mod throttle;

// Re-export main types at crate root
pub use auth::AuthenticatedStaff;
pub use error::{AuthenticationError, AuthorizationError};
pub use gate::{AccessGate, Decision, GateOutcome, GatePolicy, StaffCheck};
pub use role::{Role, STAFF_ROLES, is_staff_role};
pub use session::{
    AccessToken, CookieMutation, CookieOptions, Identity, SameSitePolicy, SessionCookies,
    SessionValidation, SignInOutcome,
};
pub use store::{RoleStore, SessionStore};
pub use throttle::{LoginThrottle, ThrottleConfig, ThrottleStatus};
