//! Trial class endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::auth::{AppState, RequireStaff};
use crate::db::TrialClassRepository;
use crate::error::TrialClassError;
use crate::types::{NewTrialClass, TrialClass, TrialClassFilter, schedule_for_backend};

/// `GET /trial-classes`
///
/// The backend returns every class newest first; status and time window are
/// applied here.
pub async fn list_trial_classes(
    State(state): State<Arc<AppState>>,
    RequireStaff(staff): RequireStaff,
    Query(filter): Query<TrialClassFilter>,
) -> Result<Json<Vec<TrialClass>>, TrialClassError> {
    let classes = TrialClassRepository::new(state.backend.clone())
        .list(staff.identity())
        .await
        .map_err(TrialClassError::backend)?;

    let now = Utc::now();
    Ok(Json(
        classes
            .into_iter()
            .filter(|class| filter.matches(class, now))
            .collect(),
    ))
}

/// `POST /trial-classes`
pub async fn book_trial_class(
    State(state): State<Arc<AppState>>,
    RequireStaff(staff): RequireStaff,
    Json(class): Json<NewTrialClass>,
) -> Result<(StatusCode, Json<Value>), TrialClassError> {
    let raw = class
        .scheduled_for
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(TrialClassError::MissingSchedule)?;
    let scheduled_for =
        schedule_for_backend(raw).ok_or_else(|| TrialClassError::InvalidSchedule {
            value: raw.to_string(),
        })?;

    if class.name.trim().is_empty() || class.email.trim().is_empty() {
        return Err(TrialClassError::InvalidInput {
            details: "Name and email are required.".to_string(),
        });
    }

    TrialClassRepository::new(state.backend.clone())
        .book(&class, &scheduled_for, staff.identity())
        .await
        .map_err(TrialClassError::backend)?;

    tracing::info!(user_id = %staff.user_id(), scheduled_for = %scheduled_for, "trial class booked");
    Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}
