//! Pizza Factory Client - Order Fulfillment over REST
//!
//! Posts persisted orders to the factory's `/api/order` endpoint with a
//! bearer API key and returns the signed receipt. Any non-success
//! status or transport failure surfaces as an error; the order service
//! turns that into a creation-failure metric and a 500.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::FactoryConfig;
use crate::domain::order::Order;
use crate::ports::fulfillment::{DinerInfo, FactoryReport, OrderFulfillment};

/// REST client for the external pizza factory.
pub struct PizzaFactoryClient {
    /// Underlying HTTP client.
    http: Client,
    /// Factory base URL.
    base_url: String,
    /// Bearer API key.
    api_key: String,
}

/// Factory fulfillment response body.
#[derive(Debug, Deserialize)]
struct FactoryResponse {
    /// Signed order receipt.
    jwt: String,
    /// Problem-report URL, when the factory provides one.
    #[serde(rename = "reportUrl")]
    report_url: Option<String>,
}

impl PizzaFactoryClient {
    /// Create a new factory client.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// Build from config, loading the API key from the
    /// PIZZA_FACTORY_KEY env var (never from config.toml).
    pub fn from_env(config: &FactoryConfig) -> Result<Self> {
        let api_key = std::env::var("PIZZA_FACTORY_KEY").context("PIZZA_FACTORY_KEY not set")?;
        Self::new(
            config.url.clone(),
            api_key,
            Duration::from_secs(config.timeout_seconds),
        )
    }
}

#[async_trait]
impl OrderFulfillment for PizzaFactoryClient {
    #[instrument(skip(self, diner, order), fields(order_id = order.id))]
    async fn fulfill(&self, diner: &DinerInfo, order: &Order) -> Result<FactoryReport> {
        let url = format!("{}/api/order", self.base_url);
        let body = serde_json::json!({
            "diner": { "id": diner.id, "name": diner.name, "email": diner.email },
            "order": order,
        });

        let response = self
            .http
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .json(&body)
            .send()
            .await
            .context("Factory request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("factory returned {status}: {text}");
        }

        let parsed: FactoryResponse = response
            .json()
            .await
            .context("Invalid factory response body")?;

        debug!(order_id = order.id, "Factory accepted order");
        Ok(FactoryReport {
            jwt: parsed.jwt,
            report_url: parsed.report_url,
        })
    }
}
