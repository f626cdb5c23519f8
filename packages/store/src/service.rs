//! # RemoteService — the hosted backend behind a stable call interface
//!
//! Everything the client knows about the backend goes through [`RemoteService`]:
//! account flows, session lookup, the session-change stream, and the four row
//! operations on the `likes` table. The same client logic therefore runs against
//! the real HTTP backend (`api::SupabaseClient`) or the in-process
//! [`MemoryStore`](crate::MemoryStore).
//!
//! Every call returns an explicit [`Result`]; nothing is swallowed at this layer.

use tokio::sync::broadcast;

use crate::models::{AuthChange, Credentials, Identity, Like, NewLike, Session};

/// Failure of a remote call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("not authorized")]
    Unauthorized,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("row already exists: {0}")]
    Conflict(String),
    #[error("expected at most one row, found {0}")]
    MultipleRows(usize),
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Async interface to the auth service and the row store.
pub trait RemoteService {
    /// Create an account. Returns the session when the backend signs the new
    /// user in immediately, `None` while email confirmation is pending.
    fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<Option<Session>, ServiceError>>;

    fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<Session, ServiceError>>;

    /// Clear the stored session. Succeeds when already signed out.
    fn sign_out(&self) -> impl std::future::Future<Output = Result<(), ServiceError>>;

    fn get_current_identity(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<Identity>, ServiceError>>;

    /// The stored session, refreshed first if it has expired.
    fn get_session(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<Session>, ServiceError>>;

    /// Session-change notifications: sign-in, sign-out, token refresh.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;

    fn query_like_row(
        &self,
        movie_id: i64,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Like>, ServiceError>>;

    fn insert_like_row(
        &self,
        like: &NewLike,
    ) -> impl std::future::Future<Output = Result<(), ServiceError>>;

    fn delete_like_row(
        &self,
        like_id: i64,
    ) -> impl std::future::Future<Output = Result<(), ServiceError>>;

    /// All likes of `user_id`, newest first.
    fn query_all_likes(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Like>, ServiceError>>;
}
