//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous client wrapper around `reqwest` for
//! pulling whole text documents. It includes middleware support for
//! exponential backoff retries on transient failures (connection errors,
//! timeouts, 5xx and 429 answers).

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::error::FetchError;

/// A standardized container for text responses.
///
/// Wraps the body along with metadata about the HTTP transaction.
#[derive(Debug)]
pub struct TextResponse {
    /// The response body when the status was 2xx.
    pub body: Option<String>,
    /// The raw body returned by the server if the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
}

/// A flexible asynchronous HTTP client.
///
/// Built on top of `reqwest_middleware`, it handles timeouts, the user agent
/// and automatic retries.
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
}

impl ApiClient {
    /// Creates a new `ApiClient` instance with a retry policy.
    ///
    /// # Arguments
    /// * `timeout` - Upper bound on a single attempt.
    /// * `max_retries` - Retries on transient failures; `0` disables retrying.
    /// * `user_agent` - Value of the `User-Agent` header.
    ///
    /// # Errors
    /// Returns `FetchError::ClientError` if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration, max_retries: u32, user_agent: &str) -> Result<Self, FetchError> {
        let base = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| FetchError::ClientError(e.to_string()))?;

        // Configure an exponential backoff policy
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

        let client = ClientBuilder::new(base)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { inner: client })
    }

    /// Parses an absolute URL.
    ///
    /// # Errors
    /// Returns `FetchError::InvalidUrl` if `url` is not absolute.
    pub fn parse_url(url: &str) -> Result<Url, FetchError> {
        Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Performs an HTTP request and reads the whole body as text.
    ///
    /// A non-2xx status is not an error at this level: it comes back with
    /// `success == false` and the server's body in `error_body`.
    ///
    /// # Errors
    /// Returns `FetchError::NetworkError` if the request could not be executed,
    /// or `FetchError::BodyError` if a 2xx body is not readable text.
    pub async fn request_text(
        &self,
        method: Method,
        url: Url,
        headers: Option<HeaderMap>,
    ) -> Result<TextResponse, FetchError> {
        let mut req = self.inner.request(method, url);

        if let Some(h) = headers {
            req = req.headers(h);
        }

        let response: reqwest::Response = req
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;
        let status = response.status();
        let success = status.is_success();

        if success {
            let body = response
                .text()
                .await
                .map_err(|e| FetchError::BodyError(e.to_string()))?;
            Ok(TextResponse {
                body: Some(body),
                error_body: None,
                status: status.as_u16(),
                success: true,
            })
        } else {
            // Capture the error body as a string for debugging
            let error_text = response.text().await.ok();
            Ok(TextResponse {
                body: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
            })
        }
    }
}
