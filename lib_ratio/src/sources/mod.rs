//! # Upstream Data Sources
//!
//! This module groups the logic for talking to the third-party data
//! provider. The [`UpstreamFetcher`] trait is the seam the freshness cache
//! consults, so the cache itself never knows about HTTP.
//!
//! ## Contained Modules:
//!
//! - **`owid`**: Our World in Data grapher CSV: the HTTP client (behind the
//!   `retrieve` feature) and the column-by-name CSV decoder.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use async_trait::async_trait;

use crate::error::FetchError;

/// Client and decoder for the Our World in Data population CSV.
pub mod owid;

/// Something that can download the raw upstream document.
#[async_trait]
pub trait UpstreamFetcher: Send + Sync {
    /// Fetches the whole document at `url` as text.
    ///
    /// # Errors
    /// Any network failure or non-success status is a `FetchError`.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}
