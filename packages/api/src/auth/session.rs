//! # SessionContext — client-side mirror of the signed-in identity
//!
//! Holds one observable value: the current [`Identity`], or `None` when signed
//! out. It is an ordinary value handed to whoever needs it (the UI provides it
//! as context), so tests and separate app instances each get their own.
//!
//! Two writers keep it in sync, and nothing else writes it:
//!
//! - [`SessionContext::initialize`] issues one fetch of the current identity.
//! - The listener returned by [`SessionContext::attach`] follows the service's
//!   change stream for as long as the service lives.
//!
//! Once a change notification has arrived, a late-resolving initial fetch no
//! longer overwrites the mirrored value.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use store::{AuthChange, Identity, RemoteService, ServiceError};
use tokio::sync::{broadcast, watch};

/// Observable identity of the current visitor.
#[derive(Clone, Debug)]
pub struct SessionContext {
    identity: Arc<watch::Sender<Option<Identity>>>,
    followed_change: Arc<AtomicBool>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// A signed-out context.
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            identity: Arc::new(identity),
            followed_change: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to `service`'s change stream and return the future that
    /// applies each change. The subscription is taken immediately; the
    /// returned future must be spawned for changes to be applied.
    pub fn attach<S: RemoteService>(
        &self,
        service: &S,
    ) -> impl Future<Output = ()> + Send + 'static {
        self.clone().follow(service.subscribe())
    }

    /// Apply changes from `changes` until the sender side is dropped.
    pub async fn follow(self, mut changes: broadcast::Receiver<AuthChange>) {
        loop {
            match changes.recv().await {
                Ok(change) => self.apply(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "auth change stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("auth change stream closed");
    }

    fn apply(&self, change: AuthChange) {
        tracing::debug!(event = ?change.event, "auth state changed");
        self.followed_change.store(true, Ordering::SeqCst);
        self.identity.send_replace(change.session.map(|s| s.user));
    }

    /// Fetch the current identity once. On failure the mirror keeps its value
    /// (signed out on a fresh context) and the error is returned.
    pub async fn initialize<S: RemoteService>(&self, service: &S) -> Result<(), ServiceError> {
        match service.get_current_identity().await {
            Ok(identity) => {
                if !self.followed_change.load(Ordering::SeqCst) {
                    self.identity.send_replace(identity);
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch current identity");
                Err(e)
            }
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.borrow().is_some()
    }

    /// A receiver that wakes on every identity change.
    pub fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }
}
