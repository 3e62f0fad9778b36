//! Student endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tatame_core::StudentId;

use crate::auth::{AppState, RequireStaff};
use crate::db::{StudentListQuery, StudentRepository};
use crate::error::StudentError;
use crate::types::{Student, StudentInput, StudentSummary};

fn parse_id(raw: &str) -> Result<StudentId, StudentError> {
    raw.parse().map_err(|_| StudentError::NotFound {
        id: raw.to_string(),
    })
}

/// `GET /students`
pub async fn list_students(
    State(state): State<Arc<AppState>>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<Vec<StudentSummary>>, StudentError> {
    let students = StudentRepository::new(state.backend.clone())
        .list(&query, staff.identity())
        .await
        .map_err(StudentError::backend)?;
    Ok(Json(students))
}

/// `POST /students`
pub async fn create_student(
    State(state): State<Arc<AppState>>,
    RequireStaff(staff): RequireStaff,
    Json(input): Json<StudentInput>,
) -> Result<(StatusCode, Json<Value>), StudentError> {
    input
        .validate()
        .map_err(|details| StudentError::InvalidInput { details })?;

    StudentRepository::new(state.backend.clone())
        .upsert(&input, staff.identity())
        .await
        .map_err(StudentError::backend)?;

    tracing::info!(user_id = %staff.user_id(), "student saved");
    Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}

/// `GET /students/{id}`
pub async fn get_student(
    State(state): State<Arc<AppState>>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<String>,
) -> Result<Json<Student>, StudentError> {
    let student_id = parse_id(&id)?;
    StudentRepository::new(state.backend.clone())
        .find_by_id(&student_id, staff.identity())
        .await
        .map_err(StudentError::backend)?
        .map(Json)
        .ok_or(StudentError::NotFound { id })
}

/// `PUT /students/{id}`
pub async fn update_student(
    State(state): State<Arc<AppState>>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<String>,
    Json(input): Json<StudentInput>,
) -> Result<Json<Value>, StudentError> {
    let student_id = parse_id(&id)?;
    input
        .validate()
        .map_err(|details| StudentError::InvalidInput { details })?;

    let updated = StudentRepository::new(state.backend.clone())
        .update(&student_id, &input, staff.identity())
        .await
        .map_err(StudentError::backend)?;
    if !updated {
        return Err(StudentError::NotFound { id });
    }

    tracing::info!(user_id = %staff.user_id(), student_id = %student_id, "student updated");
    Ok(Json(json!({ "success": true })))
}
