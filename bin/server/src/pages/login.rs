//! Sign-in page.

use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::AppState;

/// Query parameters of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    error: Option<String>,
}

/// Login page. Shows a notice when the gate sent a non-staff caller here.
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    let notice = match query.error.as_deref() {
        Some("forbidden") => {
            "<p class=\"notice\" role=\"alert\">Acesso restrito à equipe da academia.</p>\n"
        }
        _ => "",
    };
    let staff_home = super::escape(state.gate.policy().protected_prefix());

    super::layout(
        "Entrar",
        &format!(
            "<main class=\"login-page\">\n<h1>Entrar</h1>\n{notice}\
             <form id=\"login\" data-success=\"{staff_home}\">\n\
             <label>E-mail <input type=\"email\" name=\"email\" required/></label>\n\
             <label>Senha <input type=\"password\" name=\"password\" required/></label>\n\
             <button type=\"submit\">Entrar</button>\n</form>\n\
             <script>\n\
             document.getElementById('login').addEventListener('submit', async (e) => {{\n\
               e.preventDefault();\n\
               const form = new FormData(e.target);\n\
               const res = await fetch('/api/auth/login', {{\n\
                 method: 'POST',\n\
                 headers: {{ 'Content-Type': 'application/json' }},\n\
                 body: JSON.stringify({{ email: form.get('email'), password: form.get('password') }}),\n\
               }});\n\
               if (res.ok) {{ window.location.href = e.target.dataset.success; return; }}\n\
               const body = await res.json().catch(() => ({{}}));\n\
               alert(body.error || 'Erro no login.');\n\
             }});\n\
             </script>\n</main>"
        ),
    )
}
