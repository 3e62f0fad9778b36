//! Plan and class group endpoints.

use axum::{Json, extract::State};
use std::sync::Arc;

use crate::auth::{AppState, RequireStaff};
use crate::db::CatalogRepository;
use crate::error::CatalogError;
use crate::types::{ClassGroup, Plan};

/// `GET /plans`
pub async fn list_plans(
    State(state): State<Arc<AppState>>,
    RequireStaff(staff): RequireStaff,
) -> Result<Json<Vec<Plan>>, CatalogError> {
    CatalogRepository::new(state.backend.clone())
        .list_plans(staff.identity())
        .await
        .map(Json)
        .map_err(CatalogError::backend)
}

/// `GET /classes`
pub async fn list_class_groups(
    State(state): State<Arc<AppState>>,
    RequireStaff(staff): RequireStaff,
) -> Result<Json<Vec<ClassGroup>>, CatalogError> {
    CatalogRepository::new(state.backend.clone())
        .list_class_groups(staff.identity())
        .await
        .map(Json)
        .map_err(CatalogError::backend)
}
