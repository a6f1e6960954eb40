//! # Configuration Modules
//!
//! This module aggregates the configuration of the pipeline.

/// Defaults and environment overrides for the pipeline.
pub mod config_sys;

pub use config_sys::{RatioConfig, DEFAULT_CACHE_FILE, DEFAULT_FRESHNESS_SECS, OWID_CSV};
