//! [`RoleStore`] reading the `profiles` table.

use async_trait::async_trait;
use tatame_core::Result;
use serde::Deserialize;
use tatame_access::{AuthorizationError, Identity, Role, RoleStore};
use tracing::{debug, instrument};

use crate::client::BackendClient;

const PROFILES_TABLE: &str = "profiles";

#[derive(Debug, Deserialize)]
struct ProfileRow {
    role: Option<String>,
}

/// Role lookup by identity, performed with the caller's own token so the
/// table's row-level rules apply.
#[derive(Clone)]
pub struct BackendRoleStore {
    client: BackendClient,
}

impl BackendRoleStore {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoleStore for BackendRoleStore {
    #[instrument(skip_all, fields(user_id = %identity.id()))]
    async fn get_role(&self, identity: &Identity) -> Result<Option<Role>, AuthorizationError> {
        let query = [
            ("select", "role".to_string()),
            ("id", format!("eq.{}", identity.id())),
        ];
        let rows: Vec<ProfileRow> = self
            .client
            .select_rows(PROFILES_TABLE, &query, identity)
            .await
            .map_err(|e| AuthorizationError::LookupFailed {
                reason: e.to_string(),
            })?;

        match rows.as_slice() {
            [] => {
                debug!("no profile row");
                Ok(None)
            }
            [row] => Ok(row.role.as_deref().map(Role::new)),
            _ => Err(AuthorizationError::AmbiguousRole {
                user_id: identity.id().clone(),
                rows: rows.len(),
            }
            .into()),
        }
    }
}
