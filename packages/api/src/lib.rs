//! # API crate — the client core every frontend calls
//!
//! Holds the logic between the views and the hosted backend. Nothing in here
//! renders anything; the `ui` crate wraps these types in Dioxus context and hooks.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Backend settings from the environment, [`SessionContext`] (the observable mirror of the signed-in identity), and saving the session across reloads |
//! | [`client`] | [`SupabaseClient`], the HTTP implementation of [`store::RemoteService`] |
//! | [`likes`] | [`LikesManager`]: check, toggle and list the visitor's liked movies |
//! | [`guard`] | [`NavigationGuard`]: the redirect rules applied on every navigation to a route that declares its [`Access`] |
//!
//! All of them are generic over [`store::RemoteService`], so tests run them
//! against [`store::MemoryStore`].

pub mod auth;
pub mod client;
pub mod guard;
pub mod likes;

#[cfg(test)]
mod testing;

pub use auth::SessionContext;
pub use client::SupabaseClient;
pub use guard::{Access, Navigation, NavigationGuard, RouteAccess};
pub use likes::LikesManager;

pub use store::{
    AuthChange, AuthEvent, Credentials, Identity, Like, MemoryStore, Movie, RemoteService,
    ServiceError, Session, SupabaseConfig,
};
