//! Student records.

use chrono::Utc;
use rootcause::prelude::Report;
use serde::Deserialize;
use serde_json::json;
use tatame_access::Identity;
use tatame_backend::{BackendClient, BackendError};
use tatame_core::StudentId;

use crate::types::{Student, StudentInput, StudentSummary, non_blank};

const STUDENTS_TABLE: &str = "alunos";

/// Paging and search for the student list.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    50
}

impl Default for StudentListQuery {
    fn default() -> Self {
        Self {
            search: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Repository for students.
pub struct StudentRepository {
    client: BackendClient,
}

impl StudentRepository {
    /// Creates a new repository.
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Lists students matching the search, one page at a time.
    pub async fn list(
        &self,
        query: &StudentListQuery,
        caller: &Identity,
    ) -> Result<Vec<StudentSummary>, Report<BackendError>> {
        let params = json!({
            "p_search": non_blank(query.search.as_deref()),
            "p_limit": query.limit,
            "p_offset": query.offset,
        });
        self.client.rpc("listar_alunos", &params, caller).await
    }

    /// Creates a student, or updates the one with the same email.
    pub async fn upsert(
        &self,
        input: &StudentInput,
        caller: &Identity,
    ) -> Result<(), Report<BackendError>> {
        let params = json!({
            "p_ativo": input.active,
            "p_data_nascimento": non_blank(input.birth_date.as_deref()),
            "p_dia_vencimento": input.due_day,
            "p_email": input.email.trim(),
            "p_nome": input.name.trim(),
            "p_plano_id": input.plan_id,
            "p_telefone": non_blank(input.phone.as_deref()),
            "p_turma_id": input.class_group_id,
        });
        self.client.rpc_unit("upsert_aluno", &params, caller).await
    }

    /// Finds a student by ID.
    pub async fn find_by_id(
        &self,
        id: &StudentId,
        caller: &Identity,
    ) -> Result<Option<Student>, Report<BackendError>> {
        let query = [("select", "*".to_string()), ("id", format!("eq.{id}"))];
        let rows: Vec<Student> = self.client.select(STUDENTS_TABLE, &query, caller).await?;
        Ok(rows.into_iter().next())
    }

    /// Overwrites a student's editable fields. Returns false if no row matched.
    pub async fn update(
        &self,
        id: &StudentId,
        input: &StudentInput,
        caller: &Identity,
    ) -> Result<bool, Report<BackendError>> {
        let body = json!({
            "nome": input.name.trim(),
            "email": input.email.trim(),
            "telefone": non_blank(input.phone.as_deref()),
            "data_nascimento": non_blank(input.birth_date.as_deref()),
            "plano_id": input.plan_id,
            "turma_id": input.class_group_id,
            "dia_vencimento": input.due_day,
            "ativo": input.active,
            "updated_at": Utc::now().to_rfc3339(),
        });
        let filter = [("id", format!("eq.{id}"))];
        let changed = self
            .client
            .update(STUDENTS_TABLE, &filter, &body, caller)
            .await?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults() {
        let query: StudentListQuery = serde_json::from_str("{}").expect("decode");
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
        assert!(query.search.is_none());
    }
}
