//! The signed-in student's own record and payment history.

use rootcause::prelude::Report;
use tatame_access::Identity;
use tatame_backend::{BackendClient, BackendError};
use tatame_core::StudentId;

use crate::types::{Payment, StudentProfile};

const STUDENTS_TABLE: &str = "alunos";
const PAYMENTS_TABLE: &str = "pagamentos";

const PROFILE_COLUMNS: &str = "id,nome,email,telefone,dia_vencimento,\
    planos:plano_id(nome,valor),\
    turmas:turma_id(nome,dias_semana,hora_inicio,hora_fim)";

const PAYMENT_COLUMNS: &str = "id,mes_referencia,data_vencimento,data_pagamento,status,valor";

/// Repository for the student area.
pub struct StudentAreaRepository {
    client: BackendClient,
}

impl StudentAreaRepository {
    /// Creates a new repository.
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Finds the student whose email matches the signed-in account.
    pub async fn find_by_email(
        &self,
        email: &str,
        caller: &Identity,
    ) -> Result<Option<StudentProfile>, Report<BackendError>> {
        let query = [
            ("select", PROFILE_COLUMNS.to_string()),
            ("email", format!("eq.{email}")),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<StudentProfile> = self.client.select(STUDENTS_TABLE, &query, caller).await?;
        Ok(rows.into_iter().next())
    }

    /// Lists a student's payments, latest due date first.
    pub async fn payments(
        &self,
        student: &StudentId,
        caller: &Identity,
    ) -> Result<Vec<Payment>, Report<BackendError>> {
        let query = [
            ("select", PAYMENT_COLUMNS.to_string()),
            ("aluno_id", format!("eq.{student}")),
            ("order", "data_vencimento.desc".to_string()),
        ];
        self.client.select(PAYMENTS_TABLE, &query, caller).await
    }
}
