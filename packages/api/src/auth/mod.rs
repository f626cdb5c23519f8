//! Authentication: backend settings, the client-side session mirror, and
//! keeping the session across reloads.

mod config;
mod persist;
mod session;

pub use config::{
    config_from_build_env, config_from_env, config_from_lookup, ConfigError, ANON_KEY_VAR,
    LIKES_TABLE_VAR, URL_VAR,
};
pub use persist::{persist_session, restore_saved_session, SessionStorage, SESSION_KEY};
pub use session::SessionContext;
