//! # Navigation guard — who may open which page
//!
//! Each route declares its [`Access`] level where it is defined, by
//! implementing [`RouteAccess`] on the app's typed route enum. On every
//! navigation [`NavigationGuard`] asks the backend for the current session
//! (nothing is cached between navigations) and applies, in order:
//!
//! 1. signed out and the page is [`Access::Protected`] → redirect to login;
//! 2. signed in and the page is [`Access::AuthOnly`] → redirect to root;
//! 3. otherwise proceed.

use std::fmt::Display;

use store::{RemoteService, ServiceError};

/// Who may open a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    /// Anyone.
    Public,
    /// Only visitors who are not signed in (login, signup).
    AuthOnly,
    /// Only signed-in visitors.
    Protected,
}

impl Access {
    /// Whether a signed-out visitor may open the page.
    pub fn allows_anonymous(self) -> bool {
        !matches!(self, Access::Protected)
    }
}

/// A route that carries its own access level.
pub trait RouteAccess {
    fn access(&self) -> Access;
}

/// Outcome of a navigation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(String),
}

/// Strip query and fragment, force a leading slash, drop trailing slashes.
pub fn normalize_path(path: &str) -> String {
    let path = path
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let trimmed = path.trim().trim_matches('/');
    format!("/{trimmed}")
}

/// Applies the access rules to each navigation.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationGuard {
    login_path: String,
    root_path: String,
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new("/login", "/")
    }
}

impl NavigationGuard {
    /// A guard redirecting signed-out visitors to `login_path` and signed-in
    /// visitors away from entry pages to `root_path`.
    pub fn new(login_path: &str, root_path: &str) -> Self {
        Self {
            login_path: normalize_path(login_path),
            root_path: normalize_path(root_path),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// The transition rules, without touching the backend.
    pub fn decide(&self, access: Access, authenticated: bool) -> Navigation {
        if !authenticated && !access.allows_anonymous() {
            Navigation::Redirect(self.login_path.clone())
        } else if authenticated && access == Access::AuthOnly {
            Navigation::Redirect(self.root_path.clone())
        } else {
            Navigation::Proceed
        }
    }

    /// Check a navigation to `route` against a fresh session lookup.
    pub async fn check<S, R>(&self, service: &S, route: &R) -> Result<Navigation, ServiceError>
    where
        S: RemoteService,
        R: RouteAccess + Display,
    {
        let access = route.access();
        let authenticated = service.get_session().await?.is_some();
        let decision = self.decide(access, authenticated);
        tracing::debug!(path = %route, ?access, authenticated, ?decision, "navigation checked");
        Ok(decision)
    }
}
