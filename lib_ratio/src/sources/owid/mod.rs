//! # Our World in Data Integration Module
//!
//! Interface to the OWID grapher export
//! `population-young-working-elderly-with-projections.csv`.
//!
//! ## Contained Modules:
//!
//! - **`apicallowid`**: HTTP client for the grapher endpoint, with retry and
//!   structured logging.
//! - **`csv_decoder`**: Turns the raw CSV text into typed [`Row`](crate::model::Row)s,
//!   locating columns by header name.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Client for downloading the grapher CSV.
#[cfg(feature = "retrieve")]
pub mod apicallowid;
/// Column-by-name decoder for the grapher CSV.
pub mod csv_decoder;

#[cfg(feature = "retrieve")]
pub use apicallowid::ApiCallOwid;
pub use csv_decoder::{decode_rows, Columns};
