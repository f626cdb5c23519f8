//! Keeping the session across reloads.
//!
//! [`SupabaseClient`] holds its session in memory only, so a page reload starts
//! signed out. [`restore_saved_session`] seeds a fresh client from a
//! [`SessionStorage`] slot before the first identity fetch, and the future
//! returned by [`persist_session`] writes the session back after every change
//! (sign-in, refresh, sign-out).

use std::future::Future;

use store::{AuthChange, RemoteService, Session};
use tokio::sync::broadcast;

use crate::client::SupabaseClient;

/// Storage key the serialized session is kept under.
pub const SESSION_KEY: &str = "movienotes.auth.session";

/// A single slot holding the serialized session.
pub trait SessionStorage {
    fn read(&self) -> Option<String>;
    /// Store `value`, or clear the slot when `None`.
    fn write(&self, value: Option<&str>);
}

/// Load the stored session into `client`. Returns whether one was restored.
/// An unreadable entry is cleared.
pub fn restore_saved_session<T: SessionStorage>(client: &SupabaseClient, storage: &T) -> bool {
    let Some(raw) = storage.read() else {
        return false;
    };
    match serde_json::from_str::<Session>(&raw) {
        Ok(session) => {
            tracing::debug!(user_id = %session.user.id, "restored saved session");
            client.restore_session(session);
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable saved session");
            storage.write(None);
            false
        }
    }
}

/// Subscribe to `service`'s change stream and return the future that mirrors
/// each change into `storage`. The subscription is taken immediately.
pub fn persist_session<S, T>(service: &S, storage: T) -> impl Future<Output = ()> + 'static
where
    S: RemoteService,
    T: SessionStorage + 'static,
{
    follow(service.subscribe(), storage)
}

async fn follow<T: SessionStorage>(mut changes: broadcast::Receiver<AuthChange>, storage: T) {
    loop {
        match changes.recv().await {
            Ok(change) => save(&storage, change.session.as_ref()),
            // The retained backlog still ends with the newest change.
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "session persistence lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn save<T: SessionStorage>(storage: &T, session: Option<&Session>) {
    match session.map(serde_json::to_string).transpose() {
        Ok(value) => storage.write(value.as_deref()),
        Err(e) => tracing::warn!(error = %e, "could not encode session"),
    }
}
