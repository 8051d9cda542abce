//! Runtime settings.
//!
//! Defaults are literal constants; a `.env` file or the process environment
//! can override them. CLI flags are applied on top by the caller.

use std::time::Duration;

use crate::data::{Endpoints, LoaderConfig};
use crate::error::AppError;

pub const ENV_TIMEOUT_SECS: &str = "SDB_TIMEOUT_SECS";
pub const ENV_CACHE_TTL_SECS: &str = "SDB_CACHE_TTL_SECS";
pub const ENV_PRECIP_URL: &str = "SDB_PRECIP_URL";
pub const ENV_SCHOOL_ACTIONS_URL: &str = "SDB_SCHOOL_ACTIONS_URL";
pub const ENV_GEO_URL: &str = "SDB_GEO_URL";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub loader: LoaderConfig,
    pub endpoints: Endpoints,
}

impl Settings {
    /// Load `.env` (if any) and read overrides from the environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut settings = Settings::default();

        if let Some(secs) = read_secs(&lookup, ENV_TIMEOUT_SECS)? {
            if secs == 0 {
                return Err(AppError::config(format!("{ENV_TIMEOUT_SECS} must be > 0.")));
            }
            settings.loader.timeout = Duration::from_secs(secs);
        }

        // 0 disables expiry.
        if let Some(secs) = read_secs(&lookup, ENV_CACHE_TTL_SECS)? {
            settings.loader.cache_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(url) = read_url(&lookup, ENV_PRECIP_URL) {
            settings.endpoints.precip = url;
        }
        if let Some(url) = read_url(&lookup, ENV_SCHOOL_ACTIONS_URL) {
            settings.endpoints.school_actions = url;
        }
        if let Some(url) = read_url(&lookup, ENV_GEO_URL) {
            settings.endpoints.geo = url;
        }

        Ok(settings)
    }
}

fn read_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>, AppError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| AppError::config(format!("{key} must be a whole number of seconds, got '{raw}'.")))
}

fn read_url(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
