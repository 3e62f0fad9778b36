//! In-process stand-in for the hosted backend, served on an ephemeral port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::oneshot;

use crate::client::BackendClient;
use crate::config::BackendConfig;

pub(crate) const API_KEY: &str = "anon-key";

#[derive(Debug, Clone)]
pub(crate) struct StubUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct StubState {
    /// Access token -> user.
    pub users: HashMap<String, StubUser>,
    /// Refresh token -> access token issued on refresh.
    pub refresh: HashMap<String, String>,
    /// (email, password) -> access token issued on sign-in.
    pub passwords: HashMap<(String, String), String>,
    /// User id -> role rows in `profiles`.
    pub profiles: HashMap<String, Vec<Option<String>>>,
    /// Table -> rows returned by selects.
    pub tables: HashMap<String, Vec<Value>>,
    /// Answer every request with 503.
    pub down: bool,
    /// Bearer tokens seen, in order.
    pub bearers: Vec<String>,
    /// Bearer tokens sent to logout.
    pub logouts: Vec<String>,
    /// Query parameters of the last select or update.
    pub last_query: HashMap<String, String>,
    /// Body of the last update.
    pub last_patch: Option<Value>,
}

impl StubState {
    pub fn with_user(mut self, access_token: &str, id: &str, email: &str) -> Self {
        self.users.insert(
            access_token.to_string(),
            StubUser {
                id: id.to_string(),
                email: Some(email.to_string()),
            },
        );
        self
    }

    pub fn with_refresh(mut self, refresh_token: &str, issues: &str) -> Self {
        self.refresh
            .insert(refresh_token.to_string(), issues.to_string());
        self
    }

    pub fn with_password(mut self, email: &str, password: &str, issues: &str) -> Self {
        self.passwords
            .insert((email.to_string(), password.to_string()), issues.to_string());
        self
    }

    pub fn with_profile(mut self, user_id: &str, roles: &[Option<&str>]) -> Self {
        self.profiles.insert(
            user_id.to_string(),
            roles.iter().map(|r| r.map(str::to_string)).collect(),
        );
        self
    }

    pub fn with_table(mut self, table: &str, rows: Vec<Value>) -> Self {
        self.tables.insert(table.to_string(), rows);
        self
    }
}

type Shared = Arc<Mutex<StubState>>;

pub(crate) struct StubServer {
    pub base_url: String,
    state: Shared,
    _shutdown: oneshot::Sender<()>,
}

impl StubServer {
    pub async fn start(state: StubState) -> Self {
        let state: Shared = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route("/auth/v1/user", get(user))
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/logout", post(logout))
            .route("/rest/v1/rpc/{function}", post(rpc))
            .route("/rest/v1/{table}", get(select).patch(update))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            _shutdown: shutdown_tx,
        }
    }

    pub fn config(&self) -> BackendConfig {
        BackendConfig::new(&self.base_url, API_KEY)
    }

    pub fn client(&self) -> BackendClient {
        BackendClient::new(&self.config()).expect("client")
    }

    pub fn inspect<R>(&self, f: impl FnOnce(&mut StubState) -> R) -> R {
        let mut state = self.state.lock().expect("stub state");
        f(&mut state)
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn has_api_key(headers: &HeaderMap) -> bool {
    headers
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == API_KEY)
}

fn unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "message": "backend down" })),
    )
        .into_response()
}

fn user_json(user: &StubUser) -> Value {
    json!({ "id": user.id, "email": user.email })
}

fn issue(state: &StubState, access_token: &str, refresh_token: String) -> Response {
    let Some(user) = state.users.get(access_token) else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "unknown issued token").into_response();
    };
    Json(json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "expires_in": 3600,
        "expires_at": chrono::Utc::now().timestamp() + 3600,
        "token_type": "bearer",
        "user": user_json(user),
    }))
    .into_response()
}

async fn user(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().expect("stub state");
    if state.down {
        return unavailable();
    }
    let Some(token) = bearer(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    state.bearers.push(token.clone());
    match state.users.get(&token) {
        Some(user) if has_api_key(&headers) => Json(user_json(user)).into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "invalid JWT" })),
        )
            .into_response(),
    }
}

async fn token(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let state = state.lock().expect("stub state");
    if state.down {
        return unavailable();
    }
    let invalid = || {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid grant" })),
        )
            .into_response()
    };

    match query.get("grant_type").map(String::as_str) {
        Some("refresh_token") => {
            let refresh = body["refresh_token"].as_str().unwrap_or_default();
            match state.refresh.get(refresh) {
                Some(access) => issue(&state, access, format!("{refresh}-next")),
                None => invalid(),
            }
        }
        Some("password") => {
            let key = (
                body["email"].as_str().unwrap_or_default().to_string(),
                body["password"].as_str().unwrap_or_default().to_string(),
            );
            match state.passwords.get(&key) {
                Some(access) => issue(&state, access, format!("{access}-refresh")),
                None => invalid(),
            }
        }
        _ => invalid(),
    }
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().expect("stub state");
    if state.down {
        return unavailable();
    }
    let token = bearer(&headers).unwrap_or_default();
    state.logouts.push(token);
    StatusCode::NO_CONTENT.into_response()
}

async fn select(
    State(state): State<Shared>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().expect("stub state");
    if state.down {
        return unavailable();
    }
    if let Some(token) = bearer(&headers) {
        state.bearers.push(token);
    }
    state.last_query = query.clone();

    if table == "profiles" {
        let id = query
            .get("id")
            .and_then(|f| f.strip_prefix("eq."))
            .unwrap_or_default();
        let rows: Vec<Value> = state
            .profiles
            .get(id)
            .map(|roles| roles.iter().map(|r| json!({ "role": r })).collect())
            .unwrap_or_default();
        return Json(rows).into_response();
    }

    match state.tables.get(&table) {
        Some(rows) => Json(rows.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("relation \"{table}\" does not exist") })),
        )
            .into_response(),
    }
}

async fn update(
    State(state): State<Shared>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().expect("stub state");
    if state.down {
        return unavailable();
    }
    if let Some(token) = bearer(&headers) {
        state.bearers.push(token);
    }
    state.last_query = query;
    state.last_patch = Some(body.clone());
    let matched = state.tables.get(&table).map_or(0, Vec::len);
    Json(vec![body; matched]).into_response()
}

async fn rpc(
    State(state): State<Shared>,
    Path(function): Path<String>,
    headers: HeaderMap,
    Json(params): Json<Value>,
) -> Response {
    let mut state = state.lock().expect("stub state");
    if state.down {
        return unavailable();
    }
    if let Some(token) = bearer(&headers) {
        state.bearers.push(token);
    }
    Json(json!({ "function": function, "params": params })).into_response()
}
