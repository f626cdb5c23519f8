//! # Backend connection settings
//!
//! [`SupabaseConfig`] names the hosted project the client talks to. It can be
//! written as TOML:
//!
//! ```toml
//! url = "https://xyzcompany.supabase.co"
//! anon_key = "eyJhbGciOi..."
//! likes_table = "likes"   # optional
//! ```
//!
//! Loading it from the process environment lives in `api::auth::config`.

use serde::{Deserialize, Serialize};

/// Hosted backend project settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://xyzcompany.supabase.co`.
    pub url: String,
    /// Public anonymous API key.
    pub anon_key: String,
    /// Table holding like rows.
    #[serde(default = "default_likes_table")]
    pub likes_table: String,
}

fn default_likes_table() -> String {
    "likes".to_string()
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            likes_table: default_likes_table(),
        }
    }

    pub fn with_likes_table(mut self, table: impl Into<String>) -> Self {
        self.likes_table = table.into();
        self
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url(), path.trim_start_matches('/'))
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url(), table)
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
