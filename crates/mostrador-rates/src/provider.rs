//! # Exchange Rate Provider
//!
//! Combines a [`RateSource`] with a [`RateCache`] and the fallback policy.
//! One provider lives in the API state and is shared by every request.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mostrador_core::ExchangeRate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::RateCache;
use crate::clock::{Clock, SystemClock};
use crate::error::RatesError;
use crate::parse::select;
use crate::source::{HttpRateSource, RateSource};

/// Buy rate used when the source is unavailable (1180.00).
pub const DEFAULT_BUY: ExchangeRate = ExchangeRate::from_hundredths(118_000);

/// Sell rate used when the source is unavailable (1230.00).
pub const DEFAULT_SELL: ExchangeRate = ExchangeRate::from_hundredths(123_000);

/// Provider settings.
#[derive(Debug, Clone)]
pub struct RatesConfig {
    pub url: String,
    /// Label to look for (`blue`).
    pub quote: String,
    /// Label used when `quote` is absent (`oficial`).
    pub fallback_quote: String,
    pub ttl: Duration,
    pub timeout: Duration,
}

impl Default for RatesConfig {
    fn default() -> Self {
        RatesConfig {
            url: "https://dolarapi.com/v1/dolares".to_string(),
            quote: "blue".to_string(),
            fallback_quote: "oficial".to_string(),
            ttl: Duration::from_secs(15 * 60),
            timeout: Duration::from_secs(10),
        }
    }
}

/// What consumers see.
///
/// `success: false` means the pair is the hardcoded default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    pub success: bool,
    pub buy: ExchangeRate,
    pub sell: ExchangeRate,
    pub cached: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ExchangeRateProvider {
    source: Arc<dyn RateSource>,
    cache: RateCache,
    quote: String,
    fallback_quote: String,
}

impl ExchangeRateProvider {
    /// Provider backed by HTTP and the wall clock.
    pub fn new(config: &RatesConfig) -> Result<Self, RatesError> {
        let source = HttpRateSource::new(config.url.clone(), config.timeout)?;
        Ok(Self::with_source(Arc::new(source), Arc::new(SystemClock), config))
    }

    pub fn with_source(
        source: Arc<dyn RateSource>,
        clock: Arc<dyn Clock>,
        config: &RatesConfig,
    ) -> Self {
        let ttl = chrono::Duration::from_std(config.ttl)
            .unwrap_or_else(|_| chrono::Duration::minutes(15));
        ExchangeRateProvider {
            source,
            cache: RateCache::new(ttl, clock),
            quote: config.quote.clone(),
            fallback_quote: config.fallback_quote.clone(),
        }
    }

    /// The current quote: cached if fresh, fetched otherwise, default on
    /// any failure. Defaults are not cached, so the next call retries.
    pub async fn current(&self) -> RateQuote {
        if let Some(hit) = self.cache.get_fresh().await {
            debug!(sell = %hit.sell, "Exchange rate cache hit");
            return RateQuote {
                success: true,
                buy: hit.buy,
                sell: hit.sell,
                cached: true,
                fetched_at: hit.fetched_at,
            };
        }

        match self.fetch().await {
            Ok((buy, sell)) => {
                let stored = self.cache.store(buy, sell).await;
                info!(buy = %buy, sell = %sell, "Exchange rate refreshed");
                RateQuote {
                    success: true,
                    buy,
                    sell,
                    cached: false,
                    fetched_at: stored.fetched_at,
                }
            }
            Err(e) => {
                warn!(error = %e, "Exchange rate unavailable; using defaults");
                RateQuote {
                    success: false,
                    buy: DEFAULT_BUY,
                    sell: DEFAULT_SELL,
                    cached: false,
                    fetched_at: self.cache.now(),
                }
            }
        }
    }

    /// Sell rate, the one sales use.
    pub async fn sell_rate(&self) -> ExchangeRate {
        self.current().await.sell
    }

    /// Drops the cached quote.
    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
        info!("Exchange rate cache invalidated");
    }

    async fn fetch(&self) -> Result<(ExchangeRate, ExchangeRate), RatesError> {
        let records = self.source.fetch().await?;
        select(&records, &self.quote, &self.fallback_quote)
    }
}
