//! # SupabaseClient — the hosted backend over HTTP
//!
//! [`RemoteService`] implemented with `reqwest` against a Supabase project:
//!
//! | Concern | Endpoint |
//! |---------|----------|
//! | Sign-up | `POST /auth/v1/signup` |
//! | Sign-in | `POST /auth/v1/token?grant_type=password` |
//! | Refresh | `POST /auth/v1/token?grant_type=refresh_token` |
//! | Current user | `GET /auth/v1/user` |
//! | Sign-out | `POST /auth/v1/logout` |
//! | Like rows | `GET/POST/DELETE /rest/v1/<likes_table>` with PostgREST filters |
//!
//! Every request carries the project's `apikey` header and a bearer token: the
//! session's access token when signed in, the anon key otherwise, so row-level
//! security sees the right user.
//!
//! The session lives in shared memory inside the client. Clones share it, and
//! share the change channel that [`RemoteService::subscribe`] hands out.
//!
//! ## Error mapping
//!
//! | Response | [`ServiceError`] |
//! |----------|------------------|
//! | 409, or PostgREST code `23505` | `Conflict` |
//! | 401 / 403 | `Unauthorized` |
//! | 400 `invalid_grant` / `invalid_credentials` | `InvalidCredentials` |
//! | other non-2xx | `Rejected { status, message }` |
//! | network failure | `Transport` |
//! | unexpected body | `Decode` |

use std::sync::{Arc, RwLock};

use chrono::Utc;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use store::{
    AuthChange, Credentials, Identity, Like, NewLike, RemoteService, ServiceError, Session,
    SupabaseConfig,
};
use tokio::sync::broadcast;

const CHANGE_CAPACITY: usize = 16;
const UNIQUE_VIOLATION: &str = "23505";

/// HTTP client for a Supabase project.
#[derive(Clone, Debug)]
pub struct SupabaseClient {
    http: reqwest::Client,
    config: Arc<SupabaseConfig>,
    session: Arc<RwLock<Option<Session>>>,
    changes: broadcast::Sender<AuthChange>,
}

/// Two handles are equal when they share the same session state.
impl PartialEq for SupabaseClient {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.session, &other.session)
    }
}

/// Sign-up answers with a session when the project auto-confirms accounts and
/// with the bare user while email confirmation is pending.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(Session),
    User(Identity),
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Union of the error bodies returned by GoTrue and PostgREST.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

impl ErrorBody {
    fn code(&self) -> Option<String> {
        match &self.code {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            _ => self.error_code.clone(),
        }
    }

    fn text(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
    }
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Self {
        Self::with_http(reqwest::Client::new(), config)
    }

    pub fn with_http(http: reqwest::Client, config: SupabaseConfig) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            http,
            config: Arc::new(config),
            session: Arc::new(RwLock::new(None)),
            changes,
        }
    }

    /// Resume a previously stored session without a round trip.
    pub fn restore_session(&self, session: Session) {
        self.replace_session(Some(session));
    }

    /// The stored session as-is, without refreshing it.
    pub fn session(&self) -> Option<Session> {
        self.session.read().unwrap().clone()
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn replace_session(&self, session: Option<Session>) {
        *self.session.write().unwrap() = session;
    }

    fn notify(&self, change: AuthChange) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    fn start_session(&self, session: Session) -> Session {
        let session = session.stamped(Utc::now());
        self.replace_session(Some(session.clone()));
        self.notify(AuthChange::signed_in(session.clone()));
        session
    }

    fn end_session(&self) {
        let had_session = self.session.write().unwrap().take().is_some();
        if had_session {
            self.notify(AuthChange::signed_out());
        }
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.config.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    fn auth_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ServiceError> {
        parse_url(&self.config.auth_url(path), params)
    }

    fn likes_url(&self, params: &[(&str, String)]) -> Result<Url, ServiceError> {
        parse_url(&self.config.rest_url(&self.config.likes_table), params)
    }

    /// Access token to send with row requests, refreshing it if needed.
    async fn row_token(&self) -> Result<Option<String>, ServiceError> {
        Ok(self.get_session().await?.map(|s| s.access_token))
    }

    async fn refresh(&self, expired: Session) -> Result<Option<Session>, ServiceError> {
        tracing::debug!("refreshing expired session");
        let url = self.auth_url("token", &[("grant_type", "refresh_token".to_string())])?;
        let request = self.request(Method::POST, url, None).json(&RefreshRequest {
            refresh_token: &expired.refresh_token,
        });

        match send_json::<Session>(request).await {
            Ok(session) => {
                let session = session.stamped(Utc::now());
                self.replace_session(Some(session.clone()));
                self.notify(AuthChange::refreshed(session.clone()));
                Ok(Some(session))
            }
            Err(ServiceError::Transport(e)) => Err(ServiceError::Transport(e)),
            Err(e) => {
                tracing::warn!(error = %e, "session refresh rejected, signing out");
                self.end_session();
                Ok(None)
            }
        }
    }
}

impl RemoteService for SupabaseClient {
    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, ServiceError> {
        let url = self.auth_url("signup", &[])?;
        let request = self.request(Method::POST, url, None).json(credentials);

        match send_json::<SignUpResponse>(request).await? {
            SignUpResponse::Session(session) => Ok(Some(self.start_session(session))),
            SignUpResponse::User(user) => {
                tracing::info!(user_id = %user.id, "sign-up awaiting email confirmation");
                Ok(None)
            }
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, ServiceError> {
        let url = self.auth_url("token", &[("grant_type", "password".to_string())])?;
        let request = self.request(Method::POST, url, None).json(credentials);
        let session = send_json::<Session>(request).await?;
        Ok(self.start_session(session))
    }

    /// Clears the local session even when the server call fails; a token the
    /// server no longer knows counts as signed out.
    async fn sign_out(&self) -> Result<(), ServiceError> {
        let Some(session) = self.session() else {
            return Ok(());
        };
        let url = self.auth_url("logout", &[])?;
        let request = self.request(Method::POST, url, Some(session.access_token.as_str()));
        let result = send_empty(request).await;
        self.end_session();

        match result {
            Ok(()) | Err(ServiceError::Unauthorized) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn get_current_identity(&self) -> Result<Option<Identity>, ServiceError> {
        let Some(session) = self.get_session().await? else {
            return Ok(None);
        };
        let url = self.auth_url("user", &[])?;
        let request = self.request(Method::GET, url, Some(session.access_token.as_str()));

        match send_json::<Identity>(request).await {
            Ok(identity) => Ok(Some(identity)),
            Err(ServiceError::Unauthorized) => {
                tracing::warn!("stored session was rejected, signing out");
                self.end_session();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_session(&self) -> Result<Option<Session>, ServiceError> {
        match self.session() {
            Some(session) if session.is_expired(Utc::now()) => self.refresh(session).await,
            session => Ok(session),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }

    async fn query_like_row(
        &self,
        movie_id: i64,
        user_id: &str,
    ) -> Result<Option<Like>, ServiceError> {
        let url = self.likes_url(&[
            ("select", "*".to_string()),
            ("movie_id", format!("eq.{movie_id}")),
            ("user_id", format!("eq.{user_id}")),
        ])?;
        let token = self.row_token().await?;
        let request = self.request(Method::GET, url, token.as_deref());
        let mut rows: Vec<Like> = send_json(request).await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(ServiceError::MultipleRows(n)),
        }
    }

    async fn insert_like_row(&self, like: &NewLike) -> Result<(), ServiceError> {
        let url = self.likes_url(&[])?;
        let token = self.row_token().await?;
        let request = self
            .request(Method::POST, url, token.as_deref())
            .header("Prefer", "return=minimal")
            .json(&[like]);
        send_empty(request).await
    }

    async fn delete_like_row(&self, like_id: i64) -> Result<(), ServiceError> {
        let url = self.likes_url(&[("id", format!("eq.{like_id}"))])?;
        let token = self.row_token().await?;
        send_empty(self.request(Method::DELETE, url, token.as_deref())).await
    }

    async fn query_all_likes(&self, user_id: &str) -> Result<Vec<Like>, ServiceError> {
        let url = self.likes_url(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{user_id}")),
            ("order", "created_at.desc".to_string()),
        ])?;
        let token = self.row_token().await?;
        send_json(self.request(Method::GET, url, token.as_deref())).await
    }
}

fn parse_url(base: &str, params: &[(&str, String)]) -> Result<Url, ServiceError> {
    let parsed = if params.is_empty() {
        Url::parse(base)
    } else {
        Url::parse_with_params(base, params.iter().map(|(k, v)| (*k, v.as_str())))
    };
    parsed.map_err(|e| ServiceError::Transport(format!("invalid url {base}: {e}")))
}

async fn send(request: RequestBuilder) -> Result<Response, ServiceError> {
    let response = request
        .send()
        .await
        .map_err(|e| ServiceError::Transport(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    Err(error_for(status, &body, text))
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ServiceError> {
    let text = send(request)
        .await?
        .text()
        .await
        .map_err(|e| ServiceError::Transport(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| ServiceError::Decode(e.to_string()))
}

async fn send_empty(request: RequestBuilder) -> Result<(), ServiceError> {
    send(request).await.map(|_| ())
}

fn error_for(status: StatusCode, body: &ErrorBody, raw: String) -> ServiceError {
    let code = body.code();
    let message = body.text().unwrap_or(raw);

    if status == StatusCode::CONFLICT || code.as_deref() == Some(UNIQUE_VIOLATION) {
        return ServiceError::Conflict(message);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ServiceError::Unauthorized;
    }
    if status == StatusCode::BAD_REQUEST
        && (body.error.as_deref() == Some("invalid_grant")
            || code.as_deref() == Some("invalid_credentials"))
    {
        return ServiceError::InvalidCredentials;
    }
    ServiceError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> ErrorBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_postgrest_unique_violation() {
        let b = body(
            r#"{"code":"23505","details":null,"hint":null,
                "message":"duplicate key value violates unique constraint"}"#,
        );
        assert_eq!(
            error_for(StatusCode::CONFLICT, &b, String::new()),
            ServiceError::Conflict("duplicate key value violates unique constraint".to_string())
        );
    }

    #[test]
    fn test_gotrue_bad_password() {
        let legacy =
            body(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#);
        assert_eq!(
            error_for(StatusCode::BAD_REQUEST, &legacy, String::new()),
            ServiceError::InvalidCredentials
        );

        let current = body(
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        assert_eq!(
            error_for(StatusCode::BAD_REQUEST, &current, String::new()),
            ServiceError::InvalidCredentials
        );
    }

    #[test]
    fn test_other_failures() {
        assert_eq!(
            error_for(StatusCode::FORBIDDEN, &ErrorBody::default(), String::new()),
            ServiceError::Unauthorized
        );
        assert_eq!(
            error_for(
                StatusCode::UNPROCESSABLE_ENTITY,
                &body(r#"{"code":422,"msg":"User already registered"}"#),
                String::new()
            ),
            ServiceError::Rejected {
                status: 422,
                message: "User already registered".to_string()
            }
        );
        assert_eq!(
            error_for(StatusCode::BAD_GATEWAY, &ErrorBody::default(), "upstream".to_string()),
            ServiceError::Rejected {
                status: 502,
                message: "upstream".to_string()
            }
        );
    }

    #[test]
    fn test_likes_url_encodes_filters() {
        let client = SupabaseClient::new(SupabaseConfig::new("https://demo.supabase.co", "anon"));
        let url = client
            .likes_url(&[
                ("user_id", "eq.a b".to_string()),
                ("order", "created_at.desc".to_string()),
            ])
            .unwrap();
        assert_eq!(url.path(), "/rest/v1/likes");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("user_id".to_string(), "eq.a b".to_string()),
                ("order".to_string(), "created_at.desc".to_string())
            ]
        );
    }
}
