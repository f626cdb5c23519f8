//! This crate contains all shared UI for the workspace.

mod client;
pub use client::make_client;

mod storage;

mod auth;
pub use auth::{use_auth, use_client, AuthProvider, AuthState, LogoutButton};

mod likes;
pub use likes::{use_likes, use_likes_manager, LikeButton, LikesState};

mod navbar;
pub use navbar::Navbar;
