//! Client for the hosted backend behind the tatame back-office.
//!
//! The backend provides three things, all over HTTP:
//! - an authentication service issuing access/refresh token pairs,
//! - a row store with a `profiles` table holding each user's role,
//! - remote procedures for the academy data (students, fees, trial classes).
//!
//! [`BackendSessionStore`] and [`BackendRoleStore`] implement the
//! collaborator traits from `tatame-access`; [`BackendClient`] exposes the
//! row and procedure calls used by the staff API.

mod client;
mod config;
mod cookie;
mod error;
mod role_store;
mod session_store;
#[cfg(test)]
mod test_support;

pub use client::BackendClient;
pub use config::BackendConfig;
pub use cookie::{SessionCookieCodec, StoredSession};
pub use error::BackendError;
pub use role_store::BackendRoleStore;
pub use session_store::BackendSessionStore;
