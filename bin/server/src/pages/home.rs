//! Public landing page.

use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::auth::AppState;

/// Home page, open to everyone.
pub async fn home_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let login = super::escape(state.gate.policy().login_location());
    super::layout(
        "Início",
        &format!(
            "<main class=\"home\">\n<h1>Tatame Jiu-Jitsu</h1>\n\
             <p>Aulas para todas as idades. Agende sua aula experimental.</p>\n\
             <a href=\"{login}\">Área do professor</a>\n</main>"
        ),
    )
}
