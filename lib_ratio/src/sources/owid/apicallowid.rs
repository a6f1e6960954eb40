//! # OWID API Client
//!
//! A dedicated client for the Our World in Data grapher CSV export. It
//! downloads the full document (several megabytes, no range requests) and
//! maps every failure to a [`FetchError`].
//!
//! ## Core Features:
//! - **Resilient Fetching**: Transient failures are retried by the
//!   `ApiClient` middleware with exponential backoff.
//! - **Structured Logging**: Successful downloads, HTTP failures and network
//!   errors are reported through `tracing`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Method;
use tracing::{debug, error};

use crate::configs::RatioConfig;
use crate::error::FetchError;
use crate::retrieve::ky_http::ApiClient;
use crate::sources::UpstreamFetcher;

/// # OWID API Call Client
///
/// Wraps an `ApiClient` configured from a [`RatioConfig`].
pub struct ApiCallOwid {
    /// The underlying generic HTTP client.
    client: ApiClient,
}

impl ApiCallOwid {
    /// Initializes a new client using the timeout, retry count and user agent
    /// of `config`.
    ///
    /// # Errors
    /// Returns `FetchError::ClientError` if the HTTP client cannot be built.
    pub fn new(config: &RatioConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: ApiClient::new(config.request_timeout, config.max_retries, &config.user_agent)?,
        })
    }

    fn csv_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/csv, text/plain, */*"));
        headers
    }
}

#[async_trait]
impl UpstreamFetcher for ApiCallOwid {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = ApiClient::parse_url(url)?;

        let response = match self
            .client
            .request_text(Method::GET, parsed, Some(Self::csv_headers()))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(source = url, error = %e, "OWID request could not be executed");
                return Err(e);
            }
        };

        if !response.success {
            error!(
                source = url,
                status = response.status,
                body = response.error_body.as_deref().unwrap_or(""),
                "OWID request failed"
            );
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        let body = response
            .body
            .ok_or_else(|| FetchError::BodyError("empty response body".to_string()))?;
        debug!(source = url, bytes = body.len(), "OWID document downloaded");
        Ok(body)
    }
}
