//! Pi-hole DNS filter statistics.
//!
//! Reads today's totals from the `api.php?summaryRaw` endpoint of a Pi-hole
//! admin interface.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use icingawatch_types::DnsFilterMetrics;

use crate::AdapterError;

/// Source of DNS filter statistics.
#[async_trait]
pub trait DnsFilterApi: Send + Sync {
    /// Today's query and block totals.
    async fn summary(&self) -> Result<DnsFilterMetrics, AdapterError>;
}

/// Pi-hole adapter.
#[derive(Debug, Clone)]
pub struct PiholeAdapter {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl PiholeAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> PiholeAdapterBuilder {
        PiholeAdapterBuilder::default()
    }

    /// The `api.php` URL queried.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DnsFilterApi for PiholeAdapter {
    async fn summary(&self) -> Result<DnsFilterMetrics, AdapterError> {
        let mut request = self.client.get(&self.endpoint).query(&[("summaryRaw", "")]);
        if let Some(token) = &self.token {
            request = request.query(&[("auth", token)]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let text = response.text().await?;
        let summary: Summary = serde_json::from_str(&text)?;
        Ok(summary.into())
    }
}

/// Builder for PiholeAdapter.
#[derive(Debug, Default)]
pub struct PiholeAdapterBuilder {
    endpoint: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
}

impl PiholeAdapterBuilder {
    /// Set the `api.php` URL (default: "http://pi.hole/admin/api.php").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into()).filter(|t: &String| !t.is_empty());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the adapter.
    pub fn build(self) -> Result<PiholeAdapter, AdapterError> {
        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
            .build()
            .map_err(|e| AdapterError::Http(e.to_string()))?;

        Ok(PiholeAdapter {
            client,
            endpoint: self
                .endpoint
                .unwrap_or_else(|| "http://pi.hole/admin/api.php".to_string()),
            token: self.token,
        })
    }
}

/// Response of `api.php?summaryRaw`.
#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    dns_queries_today: u64,
    #[serde(default)]
    ads_percentage_today: f64,
    #[serde(default)]
    status: String,
}

impl From<Summary> for DnsFilterMetrics {
    fn from(summary: Summary) -> Self {
        DnsFilterMetrics {
            queries_today: summary.dns_queries_today,
            blocked_percentage: (summary.ads_percentage_today * 100.0).round() / 100.0,
            enabled: summary.status == "enabled",
        }
    }
}
