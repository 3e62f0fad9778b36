//! Student area: the signed-in student's own data.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{AppState, RequireSession};
use crate::db::StudentAreaRepository;
use crate::error::StudentAreaError;
use crate::types::{Payment, StudentProfile};

/// Response of `GET /api/student/me`.
#[derive(Debug, Serialize)]
pub struct StudentArea {
    #[serde(rename = "aluno")]
    pub student: StudentProfile,
    #[serde(rename = "pagamentos")]
    pub payments: Vec<Payment>,
}

/// `GET /api/student/me`
///
/// Open to any signed-in user; the record is matched by the account's email.
pub async fn my_student_record(
    State(state): State<Arc<AppState>>,
    RequireSession(identity): RequireSession,
) -> Result<Json<StudentArea>, StudentAreaError> {
    let Some(email) = identity.email().map(str::trim).filter(|e| !e.is_empty()) else {
        return Err(StudentAreaError::NotLinked);
    };

    let repository = StudentAreaRepository::new(state.backend.clone());
    let student = repository
        .find_by_email(email, &identity)
        .await
        .map_err(StudentAreaError::backend)?
        .ok_or(StudentAreaError::NotLinked)?;
    let payments = repository
        .payments(&student.id, &identity)
        .await
        .map_err(StudentAreaError::backend)?;

    Ok(Json(StudentArea { student, payments }))
}

#[cfg(test)]
mod tests {
    use crate::app;
    use crate::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    fn linked_backend() -> BackendStub {
        BackendStub::default()
            .respond(
                "GET alunos",
                json!([{
                    "id": 7,
                    "nome": "Marina",
                    "email": "member@example.com",
                    "dia_vencimento": 10,
                    "planos": { "nome": "Mensal", "valor": 150.0 },
                    "turmas": [{ "nome": "Adulto", "hora_inicio": "19:00" }]
                }]),
            )
            .respond(
                "GET pagamentos",
                json!([{
                    "id": 11,
                    "mes_referencia": "2025-03",
                    "data_vencimento": "2025-03-10",
                    "data_pagamento": null,
                    "status": "pendente",
                    "valor": 150.0
                }]),
            )
    }

    #[tokio::test]
    async fn student_sees_own_record_and_payments() {
        let backend = linked_backend().start().await;

        let response = app::router(academy_state(&backend.url))
            .oneshot(http_get("/api/student/me", Some("sid=m")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["aluno"]["nome"], "Marina");
        assert_eq!(body["aluno"]["planos"]["nome"], "Mensal");
        assert_eq!(body["aluno"]["turmas"]["nome"], "Adulto");
        assert_eq!(body["pagamentos"][0]["status"], "pendente");

        let student = backend.call("GET alunos");
        assert_eq!(student.bearer.as_deref(), Some("token-member"));
        assert_eq!(
            student.query.get("email").map(String::as_str),
            Some("eq.member@example.com")
        );

        let payments = backend.call("GET pagamentos");
        assert_eq!(payments.bearer.as_deref(), Some("token-member"));
        assert_eq!(payments.query.get("aluno_id").map(String::as_str), Some("eq.7"));
        assert_eq!(
            payments.query.get("order").map(String::as_str),
            Some("data_vencimento.desc")
        );
    }

    #[tokio::test]
    async fn unlinked_account_is_404() {
        let backend = BackendStub::default().start().await;

        let response = app::router(academy_state(&backend.url))
            .oneshot(http_get("/api/student/me", Some("sid=m")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(backend.calls().iter().all(|c| c.key != "GET pagamentos"));
    }

    #[tokio::test]
    async fn account_without_email_is_404() {
        let backend = linked_backend().start().await;

        let response = app::router(academy_state(&backend.url))
            .oneshot(http_get("/api/student/me", Some("sid=g")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn anonymous_caller_is_401() {
        let backend = linked_backend().start().await;

        let response = app::router(academy_state(&backend.url))
            .oneshot(http_get("/api/student/me", None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn refreshed_session_cookie_is_written() {
        let backend = linked_backend().start().await;

        let response = app::router(academy_state(&backend.url))
            .oneshot(http_get("/api/student/me", Some("sid=t-old")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            set_cookies(&response)
                .iter()
                .any(|c| c.starts_with("sid=t-new"))
        );
    }

    #[tokio::test]
    async fn backend_failure_is_500() {
        let backend = BackendStub::default()
            .fail("GET pagamentos")
            .respond("GET alunos", json!([{ "id": 7, "nome": "Marina" }]))
            .start()
            .await;

        let response = app::router(academy_state(&backend.url))
            .oneshot(http_get("/api/student/me", Some("sid=m")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
