//! # lib_ratio
//!
//! Data pipeline behind the support-ratio pages: download the Our World in
//! Data population CSV, cache it for a day, derive each entity's
//! working-age / elderly ratio series, and map entity names to URL slugs.

// Declare the modules to re-export
pub mod cache;
pub mod catalog;
pub mod configs;
pub mod error;
pub mod model;
#[cfg(feature = "retrieve")]
pub mod retrieve;
pub mod series;
pub mod service;
pub mod slug;
pub mod sources;

// Re-export everything the presentation layer needs
pub use cache::{Clock, FreshnessCache, ManualClock, SystemClock};
pub use configs::RatioConfig;
pub use error::{ConfigError, FetchError, RatioError, RatioResult, StoreError};
pub use model::{CountrySeries, PointKind, RatioPoint, Row};
pub use service::RatioService;
pub use slug::entity_to_slug;
pub use sources::UpstreamFetcher;
