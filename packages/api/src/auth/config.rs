//! Backend configuration from environment variables.

use store::SupabaseConfig;

pub const URL_VAR: &str = "SUPABASE_URL";
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";
pub const LIKES_TABLE_VAR: &str = "SUPABASE_LIKES_TABLE";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("{name} is not a valid URL ({value}): {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Read the backend settings from the process environment, loading `.env`
/// first if present.
pub fn config_from_env() -> Result<SupabaseConfig, ConfigError> {
    dotenvy::dotenv().ok();
    config_from_lookup(|name| std::env::var(name).ok())
}

/// Read the backend settings baked in at compile time. Browser builds have no
/// process environment, so the values come from the build's environment.
pub fn config_from_build_env() -> Result<SupabaseConfig, ConfigError> {
    config_from_lookup(|name| {
        match name {
            URL_VAR => option_env!("SUPABASE_URL"),
            ANON_KEY_VAR => option_env!("SUPABASE_ANON_KEY"),
            LIKES_TABLE_VAR => option_env!("SUPABASE_LIKES_TABLE"),
            _ => None,
        }
        .map(str::to_string)
    })
}

/// Build a config from any variable source. Blank values count as missing.
pub fn config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SupabaseConfig, ConfigError> {
    let get = |name: &'static str| {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let url = get(URL_VAR).ok_or(ConfigError::Missing(URL_VAR))?;
    let anon_key = get(ANON_KEY_VAR).ok_or(ConfigError::Missing(ANON_KEY_VAR))?;

    reqwest::Url::parse(&url).map_err(|e| ConfigError::InvalidUrl {
        name: URL_VAR,
        value: url.clone(),
        reason: e.to_string(),
    })?;

    let config = SupabaseConfig::new(url, anon_key);
    Ok(match get(LIKES_TABLE_VAR) {
        Some(table) => config.with_likes_table(table),
        None => config,
    })
}
