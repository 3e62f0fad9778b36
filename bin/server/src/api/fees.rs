//! Monthly fee endpoints.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::auth::{AppState, RequireStaff};
use crate::db::FeeRepository;
use crate::error::FeeError;
use crate::types::{FeeRow, FeeToggle};

/// Query of the fee grid.
#[derive(Debug, Default, Deserialize)]
pub struct FeeQuery {
    /// Defaults to the current year.
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub search: Option<String>,
}

/// `GET /fees`
pub async fn list_fees(
    State(state): State<Arc<AppState>>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<FeeQuery>,
) -> Result<Json<Vec<FeeRow>>, FeeError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    FeeRepository::new(state.backend.clone())
        .list(year, query.search.as_deref(), staff.identity())
        .await
        .map(Json)
        .map_err(FeeError::backend)
}

/// `POST /fees/toggle`
pub async fn toggle_fee(
    State(state): State<Arc<AppState>>,
    RequireStaff(staff): RequireStaff,
    Json(toggle): Json<FeeToggle>,
) -> Result<Json<Value>, FeeError> {
    FeeRepository::new(state.backend.clone())
        .set_paid(&toggle, staff.identity())
        .await
        .map_err(FeeError::backend)?;

    tracing::info!(
        user_id = %staff.user_id(),
        student_id = %toggle.student_id,
        year = toggle.year,
        month = toggle.month.as_wire(),
        paid = toggle.paid,
        "fee updated"
    );
    Ok(Json(json!({ "success": true })))
}
