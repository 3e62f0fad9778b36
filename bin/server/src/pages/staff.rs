//! Staff dashboard.

use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::auth::{AppState, RequireStaff};

/// Landing page of the staff area.
pub async fn staff_dashboard(
    State(state): State<Arc<AppState>>,
    RequireStaff(staff): RequireStaff,
) -> Html<String> {
    let who = staff
        .identity()
        .email()
        .unwrap_or_else(|| staff.user_id().as_str());
    let api = super::escape(&format!("{}/api", state.gate.policy().protected_prefix()));

    super::layout(
        "Painel",
        &format!(
            "<main class=\"dashboard\">\n<h1>Painel do professor</h1>\n\
             <p>Conectado como {} ({}).</p>\n<nav>\n\
             <a href=\"{api}/students\">Alunos</a>\n\
             <a href=\"{api}/fees\">Mensalidades</a>\n\
             <a href=\"{api}/trial-classes\">Aulas experimentais</a>\n</nav>\n\
             <button id=\"logout\">Sair</button>\n\
             <script>\n\
             document.getElementById('logout').addEventListener('click', async () => {{\n\
               await fetch('/api/auth/logout', {{ method: 'POST' }});\n\
               window.location.href = '/';\n\
             }});\n\
             </script>\n</main>",
            super::escape(who),
            super::escape(staff.role().as_str()),
        ),
    )
}
