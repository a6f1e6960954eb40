//! # Data Retrieval Module
//!
//! Generic HTTP retrieval used by the upstream data sources. Request
//! building, timeouts and retry behaviour live here so that the source
//! clients only deal with paths and status handling.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: An `ApiClient` built on `reqwest` and `reqwest-middleware`,
//!   with automatic retries and exponential backoff.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// HTTP client with retry middleware for whole-document downloads.
pub mod ky_http;
