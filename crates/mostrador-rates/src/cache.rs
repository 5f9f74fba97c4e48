//! # Rate Cache
//!
//! A single-slot, last-writer-wins cache with a freshness window.
//!
//! ```text
//!   store(buy, sell) at t0
//!        │
//!        ├──── t < t0 + ttl ────► get_fresh() = Some(quote)
//!        │
//!        └──── t ≥ t0 + ttl ────► get_fresh() = None   (caller refetches)
//! ```
//!
//! Concurrent refreshes may both hit the source; whichever stores last
//! wins. Staleness only affects displayed prices, never stock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mostrador_core::ExchangeRate;
use tokio::sync::RwLock;

use crate::clock::Clock;

/// A quote as it sits in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedQuote {
    pub buy: ExchangeRate,
    pub sell: ExchangeRate,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct RateCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: RwLock<Option<CachedQuote>>,
}

impl RateCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        RateCache {
            ttl,
            clock,
            slot: RwLock::new(None),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The cached quote, if younger than the TTL.
    pub async fn get_fresh(&self) -> Option<CachedQuote> {
        let slot = self.slot.read().await;
        let quote = (*slot)?;
        if self.clock.now() - quote.fetched_at < self.ttl {
            Some(quote)
        } else {
            None
        }
    }

    /// Replaces the cached quote, stamped with the current time.
    pub async fn store(&self, buy: ExchangeRate, sell: ExchangeRate) -> CachedQuote {
        let quote = CachedQuote {
            buy,
            sell,
            fetched_at: self.clock.now(),
        };
        *self.slot.write().await = Some(quote);
        quote
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn rate(hundredths: i64) -> ExchangeRate {
        ExchangeRate::from_hundredths(hundredths)
    }

    #[tokio::test]
    async fn test_empty_cache_is_stale() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = RateCache::new(Duration::minutes(15), clock);
        assert!(cache.get_fresh().await.is_none());
    }

    #[tokio::test]
    async fn test_fresh_until_ttl() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = RateCache::new(Duration::minutes(15), clock.clone());

        let stored = cache.store(rate(118_000), rate(123_000)).await;
        clock.advance(Duration::minutes(14));
        assert_eq!(cache.get_fresh().await, Some(stored));

        clock.advance(Duration::minutes(1));
        assert!(cache.get_fresh().await.is_none());
    }

    #[tokio::test]
    async fn test_last_writer_wins_and_invalidate() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = RateCache::new(Duration::minutes(15), clock);

        cache.store(rate(100_000), rate(110_000)).await;
        cache.store(rate(120_000), rate(125_000)).await;
        assert_eq!(cache.get_fresh().await.map(|q| q.sell), Some(rate(125_000)));

        cache.invalidate().await;
        assert!(cache.get_fresh().await.is_none());
    }
}
