//! Grafana Push Sink - Line-protocol Export over HTTP
//!
//! Posts the newline-delimited payload built by the pipeline to the
//! configured endpoint with `Authorization: Bearer <user_id>:<api_key>`.
//! Credentials come from environment variables, mirroring the rest of
//! the secret handling.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::ports::metrics_sink::MetricsSink;

/// Push credentials for the remote metrics endpoint.
///
/// Loaded from PIZZA_METRICS_USER and PIZZA_METRICS_KEY.
#[derive(Clone)]
pub struct SinkCredentials {
    /// Endpoint user id.
    pub user_id: String,
    /// Endpoint API key (never logged).
    pub api_key: String,
}

impl SinkCredentials {
    /// Load credentials from environment variables.
    pub fn from_env() -> Result<Self> {
        let user_id = std::env::var("PIZZA_METRICS_USER").context("PIZZA_METRICS_USER not set")?;
        let api_key = std::env::var("PIZZA_METRICS_KEY").context("PIZZA_METRICS_KEY not set")?;
        Ok(Self { user_id, api_key })
    }
}

/// HTTP sink for the Grafana-style push endpoint.
pub struct GrafanaSink {
    /// Underlying HTTP client.
    http: Client,
    /// Push endpoint URL.
    url: String,
    /// Bearer credentials.
    credentials: SinkCredentials,
}

impl GrafanaSink {
    /// Create a new sink.
    pub fn new(url: String, credentials: SinkCredentials, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            url,
            credentials,
        })
    }
}

#[async_trait]
impl MetricsSink for GrafanaSink {
    async fn push(&self, payload: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!(
                    "Bearer {}:{}",
                    self.credentials.user_id, self.credentials.api_key
                ),
            )
            .body(payload.to_string())
            .send()
            .await
            .context("Metrics push request failed")?;

        let status = response.status();
        anyhow::ensure!(status.is_success(), "metrics endpoint returned {status}");

        debug!(lines = payload.lines().count(), "Metrics pushed");
        Ok(())
    }
}
