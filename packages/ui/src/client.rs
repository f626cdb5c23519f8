//! Shared backend client constructor for all platforms.
//!
//! Settings come from:
//! - **Web** (WASM): the build environment (`SUPABASE_URL`, `SUPABASE_ANON_KEY`)
//! - **Native**: the process environment, after loading `.env`
//!
//! The session saved by the previous run is restored before the client is
//! handed out, so the first identity fetch already sees it.

use api::auth::{restore_saved_session, ConfigError};
use api::SupabaseClient;

use crate::storage::session_storage;

/// Create a platform-appropriate client.
pub fn make_client() -> Result<SupabaseClient, ConfigError> {
    #[cfg(target_arch = "wasm32")]
    let config = api::auth::config_from_build_env()?;
    #[cfg(not(target_arch = "wasm32"))]
    let config = api::auth::config_from_env()?;

    tracing::debug!(url = %config.url, "backend configured");
    let client = SupabaseClient::new(config);
    if restore_saved_session(&client, &session_storage()) {
        tracing::debug!("resuming saved session");
    }
    Ok(client)
}
