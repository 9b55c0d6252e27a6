//! Generic upstream HTTP client with retry, backoff, and bounded timeouts.
//!
//! Shared infrastructure for all Google API clients (vision, generative
//! text, custom search).

use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::error::{truncate_message, SearchApiError, VisionApiError};

/// Failure of a single upstream exchange, before mapping to a client error.
#[derive(Debug, thiserror::Error)]
pub enum HttpFailure {
    #[error("{0}")]
    Request(String),

    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Decode(String),
}

impl From<HttpFailure> for VisionApiError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Request(msg) => Self::Request(msg),
            HttpFailure::Status { status, body } => Self::Status { status, body },
            HttpFailure::Decode(msg) => Self::Decode(msg),
        }
    }
}

impl From<HttpFailure> for SearchApiError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Request(msg) => Self::Request(msg),
            HttpFailure::Status { status, body } => Self::Status { status, body },
            HttpFailure::Decode(msg) => Self::Decode(msg),
        }
    }
}

/// HTTP client wrapper that retries transient failures with exponential backoff.
pub struct UpstreamHttpClient {
    client: Client,
    config: HttpConfig,
}

impl UpstreamHttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpConfig) -> Result<Self, HttpFailure> {
        let client = Client::builder()
            .timeout(config.timeout)
            .https_only(true)
            .build()
            .map_err(|e| HttpFailure::Request(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Send the request produced by `build`, retrying transient failures, and
    /// decode the JSON body.
    ///
    /// `build` is called once per attempt.
    pub async fn send_json<R, F>(&self, service: &str, build: F) -> Result<R, HttpFailure>
    where
        R: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let backoff = self.build_backoff();

        retry_notify(
            backoff,
            || {
                let build = &build;
                async move { self.send_once::<R, _>(service, build).await }
            },
            |err: HttpFailure, duration: Duration| {
                warn!(
                    service,
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    async fn send_once<R, F>(
        &self,
        service: &str,
        build: &F,
    ) -> Result<R, backoff::Error<HttpFailure>>
    where
        R: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let start = Instant::now();

        let response = build(&self.client).send().await.map_err(|e| {
            let latency_ms = start.elapsed().as_millis();
            if is_transient_error(&e) {
                warn!(service, error = %e, latency_ms = latency_ms as u64, "Transient error, will retry");
                backoff::Error::transient(HttpFailure::Request(format!(
                    "Transient error (will retry): {e}"
                )))
            } else {
                warn!(service, error = %e, latency_ms = latency_ms as u64, "Permanent error, aborting");
                backoff::Error::permanent(HttpFailure::Request(format!(
                    "{service} request failed: {e}"
                )))
            }
        })?;

        let status = response.status();
        debug!(service, status = %status, "Received HTTP response");

        if !status.is_success() {
            let latency_ms = start.elapsed().as_millis();
            let body = response.text().await.unwrap_or_default();
            let err = HttpFailure::Status {
                status: status.as_u16(),
                body: truncate_message(&body),
            };
            return if is_transient_status(status) {
                warn!(service, status = %status, latency_ms = latency_ms as u64, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(err))
            } else {
                warn!(service, status = %status, latency_ms = latency_ms as u64, "Permanent HTTP error");
                Err(backoff::Error::permanent(err))
            };
        }

        let parsed: R = response.json().await.map_err(|e| {
            warn!(service, error = %e, "Failed to parse JSON response");
            backoff::Error::permanent(HttpFailure::Decode(format!(
                "Failed to parse {service} response: {e}"
            )))
        })?;

        let latency_ms = start.elapsed().as_millis();
        debug!(
            service,
            latency_ms = latency_ms as u64,
            "Request completed successfully"
        );

        Ok(parsed)
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_interval,
            max_interval: self.config.max_interval,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries.max(1)),
            ..Default::default()
        }
    }
}

/// Check if a reqwest error is transient and should be retried.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Check if an HTTP status code indicates a transient error.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}
