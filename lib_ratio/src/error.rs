//! # Pipeline Errors
//!
//! Error taxonomy for the support-ratio pipeline. Every enum here is `Clone`
//! so that a single in-flight fetch can hand the same outcome to all of its
//! waiters.

use thiserror::Error;

/// Errors raised while retrieving the upstream CSV document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    ClientError(String),

    /// The source URL could not be parsed.
    #[error("Invalid source URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connection, TLS or timeout failures, after middleware retries.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The upstream answered with a non-2xx status.
    #[error("HTTP request failed for {url}: status {status}")]
    HttpStatus { url: String, status: u16 },

    /// The response body could not be read as text.
    #[error("Failed to read response body: {0}")]
    BodyError(String),
}

/// Errors from the durable cache file.
///
/// These never reach callers of the cache: a failed read is a cold cache and a
/// failed write is logged and dropped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// I/O error reading, writing or renaming the cache file.
    #[error("I/O error on {path}: {reason}")]
    IoError { path: String, reason: String },

    /// The cache file exists but is not a valid snapshot.
    #[error("Malformed cache file {path}: {reason}")]
    JsonError { path: String, reason: String },

    /// The blocking write task was cancelled or panicked.
    #[error("Cache writer task failed: {0}")]
    TaskError(String),
}

/// Errors raised while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is set but does not parse.
    #[error("Environment variable {name} has invalid value {value:?}: {reason}")]
    InvalidEnvVar {
        name: String,
        value: String,
        reason: String,
    },
}

/// The error surfaced to consumers of the pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RatioError {
    /// The upstream data source could not be reached. There is no stale-data
    /// fallback, so this is the "data temporarily unavailable" condition.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] FetchError),

    /// The background task loading the rows panicked or was cancelled.
    #[error("Load task failed: {0}")]
    LoadFailed(String),
}

impl RatioError {
    /// True when the failure is the upstream being unreachable.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, RatioError::SourceUnavailable(_))
    }
}

/// Convenience alias used across the pipeline.
pub type RatioResult<T> = Result<T, RatioError>;
