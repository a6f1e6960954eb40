//! # Pipeline Configuration
//!
//! Runtime settings for the support-ratio pipeline: where the data comes
//! from, where the snapshot is persisted, and how long it stays fresh.
//! Values come from defaults, optionally overridden by `RATIO_*` environment
//! variables.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default upstream CSV (Our World in Data grapher export).
pub const OWID_CSV: &str =
    "https://ourworldindata.org/grapher/population-young-working-elderly-with-projections.csv";

/// Default snapshot location, relative to the working directory.
pub const DEFAULT_CACHE_FILE: &str = ".cache/owid-data.json";

/// 24 hours.
pub const DEFAULT_FRESHNESS_SECS: u64 = 86_400;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_USER_AGENT: &str = "SupportRatio/1.0";

/// # Ratio Config
///
/// Settings shared by the cache, the upstream client and the service facade.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioConfig {
    /// Absolute URL of the upstream CSV.
    pub source_url: String,
    /// File holding the persisted rows and fetch timestamp.
    pub cache_file: PathBuf,
    /// Age after which a snapshot is never served.
    pub freshness_window: Duration,
    /// Upper bound on a single upstream request.
    pub request_timeout: Duration,
    /// Retries on transient HTTP failures (exponential backoff).
    pub max_retries: u32,
    /// User agent sent upstream.
    pub user_agent: String,
}

impl Default for RatioConfig {
    fn default() -> Self {
        Self {
            source_url: OWID_CSV.to_string(),
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            freshness_window: Duration::from_secs(DEFAULT_FRESHNESS_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl fmt::Display for RatioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RatioConfig
    Source url: {},
    Cache file: {},
    Freshness window: {}s,
    Request timeout: {}s,
    Max retries: {}
",
            self.source_url,
            self.cache_file.display(),
            self.freshness_window.as_secs(),
            self.request_timeout.as_secs(),
            self.max_retries
        )
    }
}

impl RatioConfig {
    /// Builds a configuration from the defaults overridden by environment
    /// variables:
    ///
    /// * `RATIO_SOURCE_URL`
    /// * `RATIO_CACHE_FILE`
    /// * `RATIO_FRESHNESS_SECS`
    /// * `RATIO_TIMEOUT_SECS`
    /// * `RATIO_MAX_RETRIES`
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidEnvVar` when a numeric variable is set
    /// but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("RATIO_SOURCE_URL") {
            config.source_url = url;
        }
        if let Ok(path) = env::var("RATIO_CACHE_FILE") {
            config.cache_file = PathBuf::from(path);
        }
        if let Some(secs) = env_u64("RATIO_FRESHNESS_SECS")? {
            config.freshness_window = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("RATIO_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = env_u64("RATIO_MAX_RETRIES")? {
            config.max_retries = u32::try_from(retries).map_err(|e| ConfigError::InvalidEnvVar {
                name: "RATIO_MAX_RETRIES".to_string(),
                value: retries.to_string(),
                reason: e.to_string(),
            })?;
        }

        Ok(config)
    }
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(name) {
        Ok(value) => parse_u64(name, &value).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_u64(name: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            name: name.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_owid_with_a_day_window() {
        let config = RatioConfig::default();
        assert_eq!(config.source_url, OWID_CSV);
        assert_eq!(config.cache_file, PathBuf::from(".cache/owid-data.json"));
        assert_eq!(config.freshness_window, Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn numeric_values_are_validated() {
        assert_eq!(parse_u64("RATIO_TIMEOUT_SECS", " 30 "), Ok(30));
        let err = parse_u64("RATIO_FRESHNESS_SECS", "a day").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref name, .. } if name == "RATIO_FRESHNESS_SECS"));
    }
}
