//! Plans and class groups offered by the academy.

use rootcause::prelude::Report;
use tatame_access::Identity;
use tatame_backend::{BackendClient, BackendError};

use crate::types::{ClassGroup, Plan};

/// Repository for the plan and class catalogs.
pub struct CatalogRepository {
    client: BackendClient,
}

impl CatalogRepository {
    /// Creates a new repository.
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub async fn list_plans(&self, caller: &Identity) -> Result<Vec<Plan>, Report<BackendError>> {
        self.client
            .rpc("listar_planos", &serde_json::json!({}), caller)
            .await
    }

    pub async fn list_class_groups(
        &self,
        caller: &Identity,
    ) -> Result<Vec<ClassGroup>, Report<BackendError>> {
        self.client
            .rpc("listar_turmas", &serde_json::json!({}), caller)
            .await
    }
}
