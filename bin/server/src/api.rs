//! JSON API.
//!
//! The staff routes from [`router`] are mounted under the protected prefix.
//! Every staff handler takes [`RequireStaff`] and calls the backend as that
//! staff member. The student area is mounted at the site root and only needs
//! a session.
//!
//! [`RequireStaff`]: crate::auth::RequireStaff

pub mod catalog;
pub mod fees;
pub mod student_area;
pub mod students;
pub mod trial_classes;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::auth::AppState;

/// Routes of the staff API, relative to `<prefix>/api`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/students/{id}",
            get(students::get_student).put(students::update_student),
        )
        .route("/plans", get(catalog::list_plans))
        .route("/classes", get(catalog::list_class_groups))
        .route("/fees", get(fees::list_fees))
        .route("/fees/toggle", post(fees::toggle_fee))
        .route(
            "/trial-classes",
            get(trial_classes::list_trial_classes).post(trial_classes::book_trial_class),
        )
}
