//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `api_host` is empty
    /// - `app_origin` is not an absolute http(s) URL
    /// - `entry_point` is not an absolute path
    /// - `mirror_limit` is 0 or exceeds 500
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.api_host.is_empty() {
            return Err(ConfigError::Invalid { field: "api_host".into(), reason: "must not be empty".into() });
        }

        if !self.app_origin.starts_with("http://") && !self.app_origin.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "app_origin".into(),
                reason: "must be an absolute http(s) URL".into(),
            });
        }

        if !self.entry_point.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "entry_point".into(),
                reason: "must be an absolute path like /index.html".into(),
            });
        }

        if self.mirror_limit == 0 {
            return Err(ConfigError::Invalid { field: "mirror_limit".into(), reason: "must be greater than 0".into() });
        }
        if self.mirror_limit > 500 {
            return Err(ConfigError::Invalid { field: "mirror_limit".into(), reason: "must not exceed 500".into() });
        }

        Ok(())
    }
}
