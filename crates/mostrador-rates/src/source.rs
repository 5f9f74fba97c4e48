//! Where quotes come from.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::RatesError;
use crate::parse::{records, RawQuote};

/// A source of raw quote records.
#[async_trait]
pub trait RateSource: Send + Sync + std::fmt::Debug {
    async fn fetch(&self) -> Result<Vec<RawQuote>, RatesError>;
}

/// Fetches the quote list from a JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: reqwest::Client,
    url: String,
}

impl HttpRateSource {
    /// Builds a client with a whole-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RatesError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mostrador/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpRateSource {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch(&self) -> Result<Vec<RawQuote>, RatesError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RatesError::Status(status.as_u16()));
        }

        let payload: Value = response.json().await?;
        let parsed = records(&payload)?;
        debug!(url = %self.url, records = parsed.len(), "Fetched exchange rates");
        Ok(parsed)
    }
}
