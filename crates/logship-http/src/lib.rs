//! HTTP transport for the log shipping pipeline.
//!
//! Serializes a batch of records to a JSON array and POSTs it to
//! `{endpoint}/api/v1/logs` with the collector's API key in an
//! `X-API-Key` header. Each request carries its own timeout so a stalled
//! intake cannot wedge the flush loop.
//!
//! HTTP status classification follows the all-or-nothing send contract:
//! any 2xx acknowledges the whole batch, a 4xx marks it permanently
//! rejected (resending the same payload cannot succeed), and 5xx, timeouts
//! and connection errors are transient.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use logship_core::record::LogRecord;
use logship_core::transport::{Transport, TransportError};

/// Header carrying the intake API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

const INTAKE_PATH: &str = "/api/v1/logs";

/// Failure to build a transport, before any batch is sent.
#[derive(Debug, thiserror::Error)]
pub enum HttpTransportError {
    #[error("invalid API key: not a valid header value")]
    InvalidApiKey,
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Connection settings for an [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base collector URL, e.g. `https://logs.example.com`.
    pub endpoint: String,
    pub api_key: String,
    /// Bound on each individual send; wire it to the pipeline's flush
    /// timeout.
    pub timeout: Duration,
}

impl HttpTransportConfig {
    /// Reads `LOGSHIP_ENDPOINT` and `LOGSHIP_API_KEY` from the
    /// environment.
    pub fn from_env(timeout: Duration) -> Result<Self, HttpTransportError> {
        Ok(HttpTransportConfig {
            endpoint: env::var("LOGSHIP_ENDPOINT")
                .map_err(|_| HttpTransportError::MissingEnv("LOGSHIP_ENDPOINT"))?,
            api_key: env::var("LOGSHIP_API_KEY")
                .map_err(|_| HttpTransportError::MissingEnv("LOGSHIP_API_KEY"))?,
            timeout,
        })
    }
}

/// [`Transport`] implementation over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
    timeout: Duration,
}

impl HttpTransport {
    /// Builds a transport posting to `{endpoint}/api/v1/logs`.
    pub fn new(config: HttpTransportConfig) -> Result<Self, HttpTransportError> {
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| HttpTransportError::InvalidApiKey)?;
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().build()?;
        Ok(HttpTransport {
            client,
            url: format!("{}{INTAKE_PATH}", config.endpoint.trim_end_matches('/')),
            headers,
            timeout: config.timeout,
        })
    }

    /// Full intake URL this transport posts to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, batch: &[LogRecord]) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .headers(self.headers.clone())
            .json(batch)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    debug!(records = batch.len(), "batch accepted by intake");
                    Ok(())
                } else if status.is_client_error() {
                    Err(TransportError::Rejected {
                        status: status.as_u16(),
                    })
                } else {
                    Err(TransportError::Status {
                        status: status.as_u16(),
                    })
                }
            }
            Err(err) if err.is_timeout() => Err(TransportError::Timeout),
            Err(err) => Err(TransportError::Network(err.to_string())),
        }
    }
}
