//! Instrumented backend for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use store::{
    AuthChange, Credentials, Identity, Like, MemoryStore, NewLike, RemoteService, ServiceError,
    Session,
};
use tokio::sync::broadcast;

use crate::auth::SessionStorage;

/// Wraps a [`MemoryStore`], counting row queries and injecting failures or
/// suspension points on demand.
#[derive(Clone, Default)]
pub(crate) struct Probe {
    pub store: MemoryStore,
    fail_identity: Arc<AtomicBool>,
    yield_after_read: Arc<AtomicBool>,
    row_queries: Arc<AtomicUsize>,
    session_lookups: Arc<AtomicUsize>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_identity(&self) {
        self.fail_identity.store(true, Ordering::SeqCst);
    }

    /// Suspend after each like-row read so concurrent callers interleave
    /// between their read and their write.
    pub fn yield_after_read(&self) {
        self.yield_after_read.store(true, Ordering::SeqCst);
    }

    pub fn row_queries(&self) -> usize {
        self.row_queries.load(Ordering::SeqCst)
    }

    pub fn session_lookups(&self) -> usize {
        self.session_lookups.load(Ordering::SeqCst)
    }
}

impl RemoteService for Probe {
    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, ServiceError> {
        self.store.sign_up(credentials).await
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, ServiceError> {
        self.store.sign_in(credentials).await
    }

    async fn sign_out(&self) -> Result<(), ServiceError> {
        self.store.sign_out().await
    }

    async fn get_current_identity(&self) -> Result<Option<Identity>, ServiceError> {
        if self.fail_identity.load(Ordering::SeqCst) {
            return Err(ServiceError::Transport("connection reset".to_string()));
        }
        self.store.get_current_identity().await
    }

    async fn get_session(&self) -> Result<Option<Session>, ServiceError> {
        self.session_lookups.fetch_add(1, Ordering::SeqCst);
        self.store.get_session().await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.store.subscribe()
    }

    async fn query_like_row(
        &self,
        movie_id: i64,
        user_id: &str,
    ) -> Result<Option<Like>, ServiceError> {
        self.row_queries.fetch_add(1, Ordering::SeqCst);
        let row = self.store.query_like_row(movie_id, user_id).await;
        if self.yield_after_read.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        row
    }

    async fn insert_like_row(&self, like: &NewLike) -> Result<(), ServiceError> {
        self.store.insert_like_row(like).await
    }

    async fn delete_like_row(&self, like_id: i64) -> Result<(), ServiceError> {
        self.store.delete_like_row(like_id).await
    }

    async fn query_all_likes(&self, user_id: &str) -> Result<Vec<Like>, ServiceError> {
        self.row_queries.fetch_add(1, Ordering::SeqCst);
        self.store.query_all_likes(user_id).await
    }
}

/// Session storage kept in memory and shared between clones.
#[derive(Clone, Default)]
pub(crate) struct Slot(Arc<Mutex<Option<String>>>);

impl SessionStorage for Slot {
    fn read(&self) -> Option<String> {
        self.0.lock().unwrap().clone()
    }

    fn write(&self, value: Option<&str>) {
        *self.0.lock().unwrap() = value.map(str::to_string);
    }
}
