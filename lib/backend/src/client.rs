//! HTTP client for the hosted backend.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use rootcause::prelude::Report;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tatame_access::{AuthenticationError, Identity};
use tatame_core::UserId;
use tracing::{debug, instrument};

use crate::config::BackendConfig;
use crate::error::BackendError;

/// Header carrying the publishable API key on every request.
const API_KEY_HEADER: &str = "apikey";

/// User record returned by the authentication service.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token pair issued by a password or refresh grant.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    /// Absolute expiry in unix seconds, when the service provides it.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// Error body shapes used by the auth and row services.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
            .filter(|m| !m.is_empty())
    }
}

/// Client for the backend's auth, row and procedure endpoints.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BackendClient {
    /// Creates a client from configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, Report<BackendError>> {
        let base_url = config.url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(BackendError::Configuration {
                details: "backend url is empty".to_string(),
            }
            .into());
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| BackendError::Configuration {
                details: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn with_bearer(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.api_key)
            .bearer_auth(token)
    }

    /// Authenticates a row or procedure call as `identity`, falling back to
    /// the publishable key when the identity carries no token.
    fn as_caller(&self, request: RequestBuilder, identity: &Identity) -> RequestBuilder {
        let token = identity
            .access_token()
            .map_or(self.api_key.as_str(), |t| t.expose());
        self.with_bearer(request, token)
    }

    /// Resolves the user behind an access token.
    ///
    /// Returns `None` when the service rejects the token.
    #[instrument(skip_all)]
    pub(crate) async fn fetch_user(
        &self,
        access_token: &str,
    ) -> Result<Option<AuthUser>, Report<AuthenticationError>> {
        let response = self
            .with_bearer(self.http.get(self.auth_url("user")), access_token)
            .send()
            .await
            .map_err(auth_transport)?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            debug!(status = status.as_u16(), "access token rejected");
            return Ok(None);
        }

        let user = decode_auth::<AuthUser>(response).await?;
        Ok(Some(user))
    }

    /// Exchanges a refresh token for a new token pair.
    ///
    /// Returns `None` when the refresh token is rejected (revoked, reused or expired).
    #[instrument(skip_all)]
    pub(crate) async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<Option<TokenResponse>, Report<AuthenticationError>> {
        self.token_grant(
            "refresh_token",
            &serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    /// Exchanges an email and password for a token pair.
    ///
    /// Returns `None` when the credentials are rejected.
    #[instrument(skip(self, password))]
    pub(crate) async fn password_grant(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<TokenResponse>, Report<AuthenticationError>> {
        self.token_grant(
            "password",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: &serde_json::Value,
    ) -> Result<Option<TokenResponse>, Report<AuthenticationError>> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(auth_transport)?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            debug!(grant_type, status = status.as_u16(), "token grant rejected");
            return Ok(None);
        }

        let tokens = decode_auth::<TokenResponse>(response).await?;
        Ok(Some(tokens))
    }

    /// Revokes the session behind an access token.
    ///
    /// A token the service no longer recognises counts as already revoked.
    #[instrument(skip_all)]
    pub(crate) async fn logout(&self, access_token: &str) -> Result<(), Report<AuthenticationError>> {
        let response = self
            .with_bearer(self.http.post(self.auth_url("logout")), access_token)
            .send()
            .await
            .map_err(auth_transport)?;

        let status = response.status();
        if status.is_success()
            || matches!(
                status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
            )
        {
            return Ok(());
        }

        Err(AuthenticationError::ProviderError {
            status: status.as_u16(),
            reason: error_message(response).await,
        }
        .into())
    }

    /// Calls a remote procedure as `identity` and decodes its result.
    #[instrument(skip(self, params, identity), fields(user_id = %identity.id()))]
    pub async fn rpc<P, T>(
        &self,
        function: &str,
        params: &P,
        identity: &Identity,
    ) -> Result<T, Report<BackendError>>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .as_caller(self.http.post(self.rest_url(&format!("rpc/{function}"))), identity)
            .json(params);
        Ok(send_json(request).await?)
    }

    /// Calls a remote procedure whose result is ignored.
    #[instrument(skip(self, params, identity), fields(user_id = %identity.id()))]
    pub async fn rpc_unit<P>(
        &self,
        function: &str,
        params: &P,
        identity: &Identity,
    ) -> Result<(), Report<BackendError>>
    where
        P: Serialize + ?Sized,
    {
        let request = self
            .as_caller(self.http.post(self.rest_url(&format!("rpc/{function}"))), identity)
            .json(params);
        send_expect_success(request).await?;
        Ok(())
    }

    /// Reads rows from a table as `identity`.
    ///
    /// `query` holds row-service query parameters such as
    /// `("select", "id,nome")` or `("id", "eq.42")`.
    #[instrument(skip(self, query, identity), fields(user_id = %identity.id()))]
    pub async fn select<T>(
        &self,
        table: &str,
        query: &[(&str, String)],
        identity: &Identity,
    ) -> Result<Vec<T>, Report<BackendError>>
    where
        T: DeserializeOwned,
    {
        Ok(self.select_rows(table, query, identity).await?)
    }

    pub(crate) async fn select_rows<T>(
        &self,
        table: &str,
        query: &[(&str, String)],
        identity: &Identity,
    ) -> Result<Vec<T>, BackendError>
    where
        T: DeserializeOwned,
    {
        let request = self
            .as_caller(self.http.get(self.rest_url(table)), identity)
            .query(query);
        send_json(request).await
    }

    /// Updates rows matching `filter` as `identity`; returns the number of rows changed.
    #[instrument(skip(self, filter, body, identity), fields(user_id = %identity.id()))]
    pub async fn update<B>(
        &self,
        table: &str,
        filter: &[(&str, String)],
        body: &B,
        identity: &Identity,
    ) -> Result<usize, Report<BackendError>>
    where
        B: Serialize + ?Sized,
    {
        let request = self
            .as_caller(self.http.patch(self.rest_url(table)), identity)
            .query(filter)
            .header("Prefer", "return=representation")
            .json(body);
        let rows: Vec<serde_json::Value> = send_json(request).await?;
        Ok(rows.len())
    }
}

fn auth_transport(err: reqwest::Error) -> AuthenticationError {
    if err.is_timeout() {
        AuthenticationError::TimedOut {
            operation: "auth request",
        }
    } else {
        AuthenticationError::Unavailable {
            reason: err.to_string(),
        }
    }
}

async fn decode_auth<T: DeserializeOwned>(
    response: Response,
) -> Result<T, Report<AuthenticationError>> {
    let status = response.status();
    if !status.is_success() {
        return Err(AuthenticationError::ProviderError {
            status: status.as_u16(),
            reason: error_message(response).await,
        }
        .into());
    }

    let value = response
        .json::<T>()
        .await
        .map_err(|e| AuthenticationError::MalformedResponse {
            reason: e.to_string(),
        })?;
    Ok(value)
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BackendError> {
    let response = request
        .send()
        .await
        .map_err(|e| BackendError::from_transport(&e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::Rejected {
            status: status.as_u16(),
            message: error_message(response).await,
        });
    }

    response.json::<T>().await.map_err(|e| BackendError::Decode {
        details: e.to_string(),
    })
}

async fn send_expect_success(request: RequestBuilder) -> Result<(), BackendError> {
    let response = request
        .send()
        .await
        .map_err(|e| BackendError::from_transport(&e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::Rejected {
            status: status.as_u16(),
            message: error_message(response).await,
        });
    }
    Ok(())
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| status.to_string())
}
