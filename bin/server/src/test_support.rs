//! In-memory stores, a recording backend stub, and request helpers for
//! router tests.

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::{Body, Bytes, to_bytes},
    extract::{Query, State},
    http::{HeaderMap, Method, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tatame_access::{
    AccessGate, AccessToken, AuthenticationError, AuthorizationError, CookieMutation,
    CookieOptions, GatePolicy, Identity, LoginThrottle, Role, RoleStore, SessionCookies,
    SessionStore, SessionValidation, SignInOutcome, ThrottleConfig,
};
use tatame_backend::{BackendClient, BackendConfig};
use tatame_core::Result;
use tokio::sync::oneshot;

use crate::auth::AppState;

pub(crate) const SID: &str = "sid";

/// Address nothing listens on.
pub(crate) const UNREACHABLE_BACKEND: &str = "http://127.0.0.1:9";

/// Sessions keyed by the `sid` cookie. A rotating session is refreshed
/// into a new `sid` exactly once; replaying the old value afterwards
/// finds nothing, like a reused refresh token.
#[derive(Default)]
pub(crate) struct FakeSessions {
    pub(crate) sessions: HashMap<String, Identity>,
    pub(crate) rotations: HashMap<String, String>,
    pub(crate) consumed: Mutex<Vec<String>>,
    /// Sessions that validate as-is once, then rotate on the next look.
    pub(crate) late_rotations: HashMap<String, String>,
    pub(crate) looks: Mutex<HashMap<String, usize>>,
    pub(crate) passwords: HashMap<(String, String), String>,
    pub(crate) down: bool,
    pub(crate) revoke_fails: bool,
    pub(crate) revoked: Mutex<Vec<String>>,
}

fn set_sid(value: &str) -> CookieMutation {
    CookieMutation::Set {
        name: SID.to_string(),
        value: value.to_string(),
        options: CookieOptions::default(),
    }
}

fn unavailable() -> AuthenticationError {
    AuthenticationError::Unavailable {
        reason: "down".to_string(),
    }
}

#[async_trait]
impl SessionStore for FakeSessions {
    async fn validate_and_maybe_refresh(
        &self,
        cookies: &SessionCookies,
    ) -> Result<SessionValidation, AuthenticationError> {
        if self.down {
            return Err(unavailable().into());
        }
        let Some(sid) = cookies.get(SID) else {
            return Ok(SessionValidation::anonymous());
        };

        if let Some(next) = self.late_rotations.get(sid) {
            let mut looks = self.looks.lock().expect("lock");
            let seen = looks.entry(sid.to_string()).or_insert(0);
            *seen += 1;
            return Ok(match *seen {
                1 => SessionValidation::authenticated(self.sessions[next].clone()),
                2 => SessionValidation {
                    identity: self.sessions.get(next).cloned(),
                    cookie_mutations: vec![set_sid(next)],
                },
                _ => SessionValidation::anonymous().with_mutations(self.clear_session(cookies)),
            });
        }

        if let Some(next) = self.rotations.get(sid) {
            let mut consumed = self.consumed.lock().expect("lock");
            if consumed.iter().any(|c| c == sid) {
                return Ok(SessionValidation::anonymous().with_mutations(self.clear_session(cookies)));
            }
            consumed.push(sid.to_string());
            return Ok(SessionValidation {
                identity: self.sessions.get(next).cloned(),
                cookie_mutations: vec![set_sid(next)],
            });
        }

        match self.sessions.get(sid) {
            Some(identity) => Ok(SessionValidation::authenticated(identity.clone())),
            None => Ok(SessionValidation::anonymous().with_mutations(self.clear_session(cookies))),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
        _cookies: &SessionCookies,
    ) -> Result<SignInOutcome, AuthenticationError> {
        if self.down {
            return Err(unavailable().into());
        }
        let key = (email.to_string(), password.to_string());
        match self.passwords.get(&key) {
            Some(sid) => Ok(SignInOutcome::Authenticated {
                identity: self.sessions[sid].clone(),
                cookie_mutations: vec![set_sid(sid)],
            }),
            None => Ok(SignInOutcome::Rejected),
        }
    }

    async fn revoke(&self, cookies: &SessionCookies) -> Result<(), AuthenticationError> {
        if let Some(sid) = cookies.get(SID) {
            self.revoked.lock().expect("lock").push(sid.to_string());
        }
        if self.revoke_fails {
            return Err(unavailable().into());
        }
        Ok(())
    }

    fn clear_session(&self, cookies: &SessionCookies) -> Vec<CookieMutation> {
        if cookies.contains(SID) {
            vec![CookieMutation::Remove {
                name: SID.to_string(),
                path: "/".to_string(),
            }]
        } else {
            Vec::new()
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeRoles {
    pub(crate) roles: HashMap<String, String>,
    pub(crate) down: bool,
}

#[async_trait]
impl RoleStore for FakeRoles {
    async fn get_role(&self, identity: &Identity) -> Result<Option<Role>, AuthorizationError> {
        if self.down {
            return Err(AuthorizationError::LookupFailed {
                reason: "down".to_string(),
            }
            .into());
        }
        Ok(self.roles.get(identity.id().as_str()).map(|r| Role::new(r.as_str())))
    }
}

pub(crate) fn identity(id: &str) -> Identity {
    Identity::new(id.parse().expect("user id"), Some(format!("{id}@example.com")))
        .with_access_token(AccessToken::new(format!("token-{id}")))
}

/// `teacher` (sid=t), `member` (sid=m, a student), `ghost` (sid=g, no
/// email), and a rotating teacher session (sid=t-old refreshes into
/// sid=t-new).
pub(crate) fn academy() -> (FakeSessions, FakeRoles) {
    let mut sessions = FakeSessions::default();
    sessions.sessions.insert("t".into(), identity("teacher"));
    sessions.sessions.insert("t-new".into(), identity("teacher"));
    sessions.sessions.insert("m".into(), identity("member"));
    sessions.sessions.insert(
        "g".into(),
        Identity::new("ghost".parse().expect("user id"), None)
            .with_access_token(AccessToken::new("token-ghost")),
    );
    sessions.rotations.insert("t-old".into(), "t-new".into());
    sessions
        .passwords
        .insert(("prof@example.com".into(), "s3cret".into()), "t".into());

    let mut roles = FakeRoles::default();
    roles.roles.insert("teacher".into(), "teacher".into());
    roles.roles.insert("member".into(), "student".into());
    (sessions, roles)
}

pub(crate) fn app_state(
    sessions: FakeSessions,
    roles: FakeRoles,
    throttle: ThrottleConfig,
    backend_url: &str,
) -> (Arc<AppState>, Arc<FakeSessions>) {
    let sessions = Arc::new(sessions);
    let gate = AccessGate::new(
        sessions.clone(),
        Arc::new(roles),
        GatePolicy::default(),
        Duration::from_millis(200),
    );
    let backend = BackendClient::new(&BackendConfig::new(backend_url, "anon")).expect("client");
    let state = Arc::new(AppState::new(gate, LoginThrottle::new(throttle), backend));
    (state, sessions)
}

/// The default academy talking to `backend_url`.
pub(crate) fn academy_state(backend_url: &str) -> Arc<AppState> {
    let (sessions, roles) = academy();
    app_state(sessions, roles, ThrottleConfig::default(), backend_url).0
}

pub(crate) fn http_get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub(crate) fn send_json(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "198.51.100.4");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub(crate) fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub(crate) fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

pub(crate) async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

pub(crate) async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).expect("json")
}

/// One request received by [`RunningBackend`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    /// `"<METHOD> <path under /rest/v1/>"`, e.g. `"POST rpc/listar_planos"`.
    pub(crate) key: String,
    pub(crate) query: HashMap<String, String>,
    pub(crate) body: Value,
    pub(crate) bearer: Option<String>,
}

/// Canned answers for the row service, keyed like [`RecordedCall::key`].
///
/// Unconfigured procedure calls answer `null`; unconfigured reads and
/// updates answer `[]`.
#[derive(Default)]
pub(crate) struct BackendStub {
    responses: HashMap<String, Value>,
    failing: HashSet<String>,
}

#[derive(Default)]
struct StubInner {
    responses: HashMap<String, Value>,
    failing: HashSet<String>,
    calls: Vec<RecordedCall>,
}

type SharedStub = Arc<Mutex<StubInner>>;

impl BackendStub {
    pub(crate) fn respond(mut self, key: &str, value: Value) -> Self {
        self.responses.insert(key.to_string(), value);
        self
    }

    pub(crate) fn fail(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub(crate) async fn start(self) -> RunningBackend {
        let inner = Arc::new(Mutex::new(StubInner {
            responses: self.responses,
            failing: self.failing,
            calls: Vec::new(),
        }));
        let app = Router::new().fallback(answer).with_state(inner.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown, stopped) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stopped.await;
                })
                .await;
        });

        RunningBackend {
            url: format!("http://{addr}"),
            inner,
            _shutdown: shutdown,
        }
    }
}

async fn answer(
    State(inner): State<SharedStub>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().trim_start_matches("/rest/v1/");
    let key = format!("{method} {path}");
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let mut inner = inner.lock().expect("stub state");
    inner.calls.push(RecordedCall {
        key: key.clone(),
        query,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        bearer,
    });

    if inner.failing.contains(&key) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "connection to 10.0.0.5 refused" })),
        )
            .into_response();
    }

    let fallback = if method == Method::POST {
        Value::Null
    } else {
        json!([])
    };
    Json(inner.responses.get(&key).cloned().unwrap_or(fallback)).into_response()
}

/// A started [`BackendStub`]; stops when dropped.
pub(crate) struct RunningBackend {
    pub(crate) url: String,
    inner: SharedStub,
    _shutdown: oneshot::Sender<()>,
}

impl RunningBackend {
    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().expect("stub state").calls.clone()
    }

    /// The first call recorded under `key`.
    pub(crate) fn call(&self, key: &str) -> RecordedCall {
        self.calls()
            .into_iter()
            .find(|c| c.key == key)
            .unwrap_or_else(|| panic!("no call to {key}"))
    }
}
