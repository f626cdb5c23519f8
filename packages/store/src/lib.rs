pub mod config;
pub mod models;
pub mod service;

mod memory;
pub use memory::MemoryStore;

pub use config::SupabaseConfig;
pub use models::{AuthChange, AuthEvent, Credentials, Identity, Like, Movie, NewLike, Session};
pub use service::{RemoteService, ServiceError};
