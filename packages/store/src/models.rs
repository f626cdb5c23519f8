//! # Domain models shared by every backend
//!
//! These types mirror the JSON the hosted backend speaks, so they derive
//! `Serialize + Deserialize` and can be decoded straight from auth and REST
//! responses.
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`Identity`] | The signed-in visitor's account record (`id`, `email`, free-form metadata). |
//! | [`Session`] | Live token state: access/refresh tokens, expiry, and the owning [`Identity`]. |
//! | [`AuthChange`] | One notification on the session-change stream ([`AuthEvent`] + the new session, if any). |
//! | [`Movie`] | The catalogue entry a visitor can like. |
//! | [`Like`] | A persisted `(movie, user)` relationship row. |
//! | [`NewLike`] | The insert payload for a [`Like`], built from a [`Movie`] and a user id. |
//! | [`Credentials`] | Email + password pair for sign-up and sign-in. |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account record issued by the auth service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// Create an identity with no metadata.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
            user_metadata: serde_json::Map::new(),
        }
    }

    /// Name to show in the UI: `username` or `full_name` metadata, then the
    /// email, then the raw id.
    pub fn display_name(&self) -> &str {
        ["username", "full_name"]
            .iter()
            .find_map(|key| self.user_metadata.get(*key).and_then(|v| v.as_str()))
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Token state held by the remote service client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds, as issued.
    pub expires_in: i64,
    /// Unix timestamp after which the access token is no longer valid.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: Identity,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Fill in `expires_at` from `expires_in` when the server left it out.
    pub fn stamped(mut self, now: DateTime<Utc>) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = Some(now.timestamp() + self.expires_in);
        }
        self
    }

    /// Whether the access token has expired at `now`. A session with no
    /// known expiry never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now.timestamp() >= at)
    }
}

/// Kind of session change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// A notification on the session-change stream.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn signed_in(session: Session) -> Self {
        Self {
            event: AuthEvent::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            event: AuthEvent::SignedOut,
            session: None,
        }
    }

    pub fn refreshed(session: Session) -> Self {
        Self {
            event: AuthEvent::TokenRefreshed,
            session: Some(session),
        }
    }

    /// The identity carried by this change, if the visitor is still signed in.
    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// A movie as shown in the catalogue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl Movie {
    pub fn new(id: i64, title: impl Into<String>, poster_path: Option<&str>) -> Self {
        Self {
            id,
            title: title.into(),
            poster_path: poster_path.map(str::to_string),
        }
    }
}

/// A row of the `likes` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub movie_id: i64,
    pub user_id: String,
    pub movie_title: String,
    #[serde(default)]
    pub movie_poster: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the `likes` table. The backend assigns `id` and
/// `created_at`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewLike {
    pub movie_id: i64,
    pub user_id: String,
    pub movie_title: String,
    pub movie_poster: Option<String>,
}

impl NewLike {
    pub fn for_movie(movie: &Movie, user_id: &str) -> Self {
        Self {
            movie_id: movie.id,
            user_id: user_id.to_string(),
            movie_title: movie.title.clone(),
            movie_poster: movie.poster_path.clone(),
        }
    }
}

/// Email and password for the password grant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}
