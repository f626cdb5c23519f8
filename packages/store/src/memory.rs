use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::broadcast;

use crate::models::{AuthChange, Credentials, Identity, Like, NewLike, Session};
use crate::service::{RemoteService, ServiceError};

const CHANGE_CAPACITY: usize = 16;
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// In-process backend for tests.
///
/// Behaves like an auto-confirming auth service in front of a `likes` table
/// with a `unique (movie_id, user_id)` constraint and owner-only writes.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    changes: broadcast::Sender<AuthChange>,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    likes: Vec<Like>,
    next_like_id: i64,
    next_user_id: u64,
    next_token: u64,
}

#[derive(Debug)]
struct Account {
    password: String,
    identity: Identity,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            changes,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row as-is, bypassing ownership checks. Used to seed fixtures
    /// with fixed timestamps.
    pub fn seed_like(&self, like: Like) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_like_id = inner.next_like_id.max(like.id);
        inner.likes.push(like);
    }

    /// Every stored like, in insertion order.
    pub fn likes(&self) -> Vec<Like> {
        self.inner.lock().unwrap().likes.clone()
    }

    /// Mark the current access token as expired so the next session lookup
    /// has to refresh it.
    pub fn expire_session(&self) {
        if let Some(session) = self.inner.lock().unwrap().session.as_mut() {
            session.expires_at = Some(0);
        }
    }

    fn notify(&self, change: AuthChange) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    fn current_session(&self) -> Option<Session> {
        let refreshed = {
            let mut inner = self.inner.lock().unwrap();
            let session = inner.session.clone()?;
            if !session.is_expired(Utc::now()) {
                return Some(session);
            }
            let session = inner.issue_session(session.user);
            inner.session = Some(session.clone());
            session
        };
        self.notify(AuthChange::refreshed(refreshed.clone()));
        Some(refreshed)
    }

    fn require_owner(&self, user_id: &str) -> Result<(), ServiceError> {
        match self.current_session() {
            Some(session) if session.user.id == user_id => Ok(()),
            _ => Err(ServiceError::Unauthorized),
        }
    }
}

impl Inner {
    fn issue_session(&mut self, user: Identity) -> Session {
        self.next_token += 1;
        Session {
            access_token: format!("access-{}", self.next_token),
            refresh_token: format!("refresh-{}", self.next_token),
            token_type: "bearer".to_string(),
            expires_in: TOKEN_LIFETIME_SECS,
            expires_at: None,
            user,
        }
        .stamped(Utc::now())
    }
}

impl RemoteService for MemoryStore {
    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, ServiceError> {
        let email = credentials.email.trim().to_lowercase();
        let session = {
            let mut inner = self.inner.lock().unwrap();
            if inner.accounts.contains_key(&email) {
                return Err(ServiceError::Rejected {
                    status: 422,
                    message: "User already registered".to_string(),
                });
            }
            inner.next_user_id += 1;
            let identity = Identity::new(format!("user-{}", inner.next_user_id), email.clone());
            inner.accounts.insert(
                email,
                Account {
                    password: credentials.password.clone(),
                    identity: identity.clone(),
                },
            );
            let session = inner.issue_session(identity);
            inner.session = Some(session.clone());
            session
        };
        self.notify(AuthChange::signed_in(session.clone()));
        Ok(Some(session))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, ServiceError> {
        let email = credentials.email.trim().to_lowercase();
        let session = {
            let mut inner = self.inner.lock().unwrap();
            let identity = match inner.accounts.get(&email) {
                Some(account) if account.password == credentials.password => {
                    account.identity.clone()
                }
                _ => return Err(ServiceError::InvalidCredentials),
            };
            let session = inner.issue_session(identity);
            inner.session = Some(session.clone());
            session
        };
        self.notify(AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ServiceError> {
        let had_session = self.inner.lock().unwrap().session.take().is_some();
        if had_session {
            self.notify(AuthChange::signed_out());
        }
        Ok(())
    }

    async fn get_current_identity(&self) -> Result<Option<Identity>, ServiceError> {
        Ok(self.current_session().map(|s| s.user))
    }

    async fn get_session(&self) -> Result<Option<Session>, ServiceError> {
        Ok(self.current_session())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }

    async fn query_like_row(
        &self,
        movie_id: i64,
        user_id: &str,
    ) -> Result<Option<Like>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner
            .likes
            .iter()
            .filter(|l| l.movie_id == movie_id && l.user_id == user_id);
        let first = rows.next().cloned();
        let extra = rows.count();
        if extra > 0 {
            return Err(ServiceError::MultipleRows(extra + 1));
        }
        Ok(first)
    }

    async fn insert_like_row(&self, like: &NewLike) -> Result<(), ServiceError> {
        self.require_owner(&like.user_id)?;

        let mut inner = self.inner.lock().unwrap();
        if inner
            .likes
            .iter()
            .any(|l| l.movie_id == like.movie_id && l.user_id == like.user_id)
        {
            return Err(ServiceError::Conflict(format!(
                "like for movie {} by {} already exists",
                like.movie_id, like.user_id
            )));
        }
        inner.next_like_id += 1;
        let id = inner.next_like_id;
        inner.likes.push(Like {
            id,
            movie_id: like.movie_id,
            user_id: like.user_id.clone(),
            movie_title: like.movie_title.clone(),
            movie_poster: like.movie_poster.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete_like_row(&self, like_id: i64) -> Result<(), ServiceError> {
        let owner = self
            .inner
            .lock()
            .unwrap()
            .likes
            .iter()
            .find(|l| l.id == like_id)
            .map(|l| l.user_id.clone());

        // Deleting a missing row matches nothing and succeeds.
        let Some(owner) = owner else {
            return Ok(());
        };
        self.require_owner(&owner)?;

        self.inner.lock().unwrap().likes.retain(|l| l.id != like_id);
        Ok(())
    }

    async fn query_all_likes(&self, user_id: &str) -> Result<Vec<Like>, ServiceError> {
        let mut likes: Vec<Like> = self
            .inner
            .lock()
            .unwrap()
            .likes
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        likes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(likes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthEvent, Movie};

    fn matrix() -> Movie {
        Movie {
            id: 603,
            title: "The Matrix".to_string(),
            poster_path: Some("/matrix.jpg".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let store = MemoryStore::new();
        let creds = Credentials::new("Ada@Example.com", "hunter22");

        let session = store.sign_up(&creds).await.unwrap().unwrap();
        assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));

        store.sign_out().await.unwrap();
        assert!(store.get_session().await.unwrap().is_none());

        let again = store.sign_in(&creds).await.unwrap();
        assert_eq!(again.user.id, session.user.id);
        assert_ne!(again.access_token, session.access_token);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_is_rejected() {
        let store = MemoryStore::new();
        let creds = Credentials::new("ada@example.com", "hunter22");
        store.sign_up(&creds).await.unwrap();

        let err = store.sign_up(&creds).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected { status: 422, .. }));
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let store = MemoryStore::new();
        store
            .sign_up(&Credentials::new("ada@example.com", "hunter22"))
            .await
            .unwrap();

        let err = store
            .sign_in(&Credentials::new("ada@example.com", "nope"))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_notifications() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();

        store
            .sign_up(&Credentials::new("ada@example.com", "hunter22"))
            .await
            .unwrap();
        store.expire_session();
        store.get_session().await.unwrap();
        store.sign_out().await.unwrap();
        // Second sign-out has nothing to clear and stays quiet.
        store.sign_out().await.unwrap();

        assert_eq!(changes.recv().await.unwrap().event, AuthEvent::SignedIn);
        assert_eq!(changes.recv().await.unwrap().event, AuthEvent::TokenRefreshed);
        assert_eq!(changes.recv().await.unwrap().event, AuthEvent::SignedOut);
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_expired_session_is_refreshed() {
        let store = MemoryStore::new();
        let first = store
            .sign_up(&Credentials::new("ada@example.com", "hunter22"))
            .await
            .unwrap()
            .unwrap();

        store.expire_session();
        let refreshed = store.get_session().await.unwrap().unwrap();
        assert_ne!(refreshed.access_token, first.access_token);
        assert!(!refreshed.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_unique_like_constraint() {
        let store = MemoryStore::new();
        let session = store
            .sign_up(&Credentials::new("ada@example.com", "hunter22"))
            .await
            .unwrap()
            .unwrap();
        let like = NewLike::for_movie(&matrix(), &session.user.id);

        store.insert_like_row(&like).await.unwrap();
        let err = store.insert_like_row(&like).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(store.likes().len(), 1);
    }

    #[tokio::test]
    async fn test_writes_require_owner() {
        let store = MemoryStore::new();
        let like = NewLike::for_movie(&matrix(), "someone-else");

        assert_eq!(
            store.insert_like_row(&like).await.unwrap_err(),
            ServiceError::Unauthorized
        );

        let session = store
            .sign_up(&Credentials::new("ada@example.com", "hunter22"))
            .await
            .unwrap()
            .unwrap();
        store
            .insert_like_row(&NewLike::for_movie(&matrix(), &session.user.id))
            .await
            .unwrap();
        let id = store.likes()[0].id;

        store.sign_out().await.unwrap();
        assert_eq!(
            store.delete_like_row(id).await.unwrap_err(),
            ServiceError::Unauthorized
        );
        assert_eq!(store.likes().len(), 1);
    }

    #[tokio::test]
    async fn test_query_like_row_rejects_duplicates() {
        let store = MemoryStore::new();
        for id in [1, 2] {
            store.seed_like(Like {
                id,
                movie_id: 603,
                user_id: "u1".to_string(),
                movie_title: "The Matrix".to_string(),
                movie_poster: None,
                created_at: Utc::now(),
            });
        }

        let err = store.query_like_row(603, "u1").await.unwrap_err();
        assert_eq!(err, ServiceError::MultipleRows(2));
        assert!(store.query_like_row(603, "u2").await.unwrap().is_none());
    }
}
