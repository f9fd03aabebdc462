//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (STASH_*)
//! 2. TOML config file (if STASH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Offline-layer configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (STASH_*)
/// 2. TOML config file (if STASH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the durable store (article mirror + pending-write queue).
    ///
    /// Set via STASH_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Path to the asset cache's own SQLite namespace.
    ///
    /// Set via STASH_ASSET_CACHE_PATH environment variable.
    #[serde(default = "default_asset_cache_path")]
    pub asset_cache_path: PathBuf,

    /// Origin the application shell is served from; manifest paths are
    /// resolved against it at install time.
    ///
    /// Set via STASH_APP_ORIGIN environment variable.
    #[serde(default = "default_app_origin")]
    pub app_origin: String,

    /// Remote data service host. Requests to it (or any subdomain) bypass
    /// the asset cache entirely.
    ///
    /// Set via STASH_API_HOST environment variable.
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Path of the cached entry-point page served when a navigation fetch
    /// fails offline.
    ///
    /// Set via STASH_ENTRY_POINT environment variable.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via STASH_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via STASH_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How many of the most recent remote records the mirror holds.
    ///
    /// Set via STASH_MIRROR_LIMIT environment variable.
    #[serde(default = "default_mirror_limit")]
    pub mirror_limit: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./stash.sqlite")
}

fn default_asset_cache_path() -> PathBuf {
    PathBuf::from("./stash-assets.sqlite")
}

fn default_app_origin() -> String {
    "http://localhost:8080".into()
}

fn default_api_host() -> String {
    "supabase.co".into()
}

fn default_entry_point() -> String {
    "/index.html".into()
}

fn default_user_agent() -> String {
    "stash/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_mirror_limit() -> usize {
    20
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            asset_cache_path: default_asset_cache_path(),
            app_origin: default_app_origin(),
            api_host: default_api_host(),
            entry_point: default_entry_point(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            mirror_limit: default_mirror_limit(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `STASH_`
    /// 2. TOML file from `STASH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("STASH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("STASH_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./stash.sqlite"));
        assert_eq!(config.asset_cache_path, PathBuf::from("./stash-assets.sqlite"));
        assert_eq!(config.app_origin, "http://localhost:8080");
        assert_eq!(config.api_host, "supabase.co");
        assert_eq!(config.entry_point, "/index.html");
        assert_eq!(config.user_agent, "stash/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.mirror_limit, 20);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }
}
