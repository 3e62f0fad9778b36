//! Trial class bookings.

use rootcause::prelude::Report;
use serde_json::json;
use tatame_access::Identity;
use tatame_backend::{BackendClient, BackendError};

use crate::types::{NewTrialClass, TrialClass, non_blank};

const TRIAL_CLASSES_TABLE: &str = "aulas_experimentais";

/// Repository for trial classes.
pub struct TrialClassRepository {
    client: BackendClient,
}

impl TrialClassRepository {
    /// Creates a new repository.
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Lists all trial classes with the booked person's contact, newest first.
    pub async fn list(&self, caller: &Identity) -> Result<Vec<TrialClass>, Report<BackendError>> {
        let query = [
            ("select", "*,alunos(nome,email,telefone)".to_string()),
            ("order", "agendado_para.desc".to_string()),
        ];
        self.client
            .select(TRIAL_CLASSES_TABLE, &query, caller)
            .await
    }

    /// Books a trial class. `scheduled_for` is already in `YYYY-MM-DD HH:MM:SS` form.
    pub async fn book(
        &self,
        class: &NewTrialClass,
        scheduled_for: &str,
        caller: &Identity,
    ) -> Result<(), Report<BackendError>> {
        let params = json!({
            "p_nome": class.name.trim(),
            "p_email": class.email.trim(),
            "p_telefone": non_blank(class.phone.as_deref()),
            "p_data_nascimento": non_blank(class.birth_date.as_deref()),
            "p_plano_id": class.plan_id,
            "p_turma_id": class.class_group_id,
            "p_dia_vencimento": class.due_day,
            "p_agendado_para": scheduled_for,
        });
        self.client
            .rpc_unit("criar_aula_experimental", &params, caller)
            .await
    }
}
