//! Monthly fee grid.

use rootcause::prelude::Report;
use serde_json::json;
use tatame_access::Identity;
use tatame_backend::{BackendClient, BackendError};

use crate::types::{FeeRow, FeeToggle, non_blank};

/// Repository for monthly fees.
pub struct FeeRepository {
    client: BackendClient,
}

impl FeeRepository {
    /// Creates a new repository.
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Lists every student with their paid months for `year`.
    pub async fn list(
        &self,
        year: i32,
        search: Option<&str>,
        caller: &Identity,
    ) -> Result<Vec<FeeRow>, Report<BackendError>> {
        let params = json!({
            "p_ano": year,
            "p_search": non_blank(search),
        });
        self.client
            .rpc("listar_alunos_com_mensalidades", &params, caller)
            .await
    }

    /// Marks one month paid or unpaid.
    pub async fn set_paid(
        &self,
        toggle: &FeeToggle,
        caller: &Identity,
    ) -> Result<(), Report<BackendError>> {
        let params = json!({
            "p_aluno_id": toggle.student_id,
            "p_ano": toggle.year,
            "p_mes": toggle.month.as_wire(),
            "p_valor": toggle.paid,
        });
        self.client
            .rpc_unit("toggle_mensalidade_mes", &params, caller)
            .await
    }
}
