//! # mostrador-rates: Exchange Rate Provider
//!
//! Supplies the USD→ARS quote used to price sales in pesos.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ExchangeRateProvider::current()                      │
//! │                                                                         │
//! │   RateCache (TTL, injected Clock)                                      │
//! │      │                                                                  │
//! │      ├── fresh? ─────────────────────────► RateQuote { cached: true }  │
//! │      │                                                                  │
//! │      └── stale/empty                                                    │
//! │             │                                                           │
//! │             ▼                                                           │
//! │   RateSource::fetch()  (HttpRateSource: reqwest + timeout)             │
//! │             │                                                           │
//! │             ├── Ok(records) ─► select(target, fallback)                │
//! │             │                      │                                    │
//! │             │                      ├── found ─► store ─► success: true │
//! │             │                      └── missing ─┐                       │
//! │             └── Err ────────────────────────────┴─► warn! + defaults   │
//! │                                                      success: false     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures never propagate: callers always get a usable pair.

pub mod cache;
pub mod clock;
pub mod error;
pub mod parse;
pub mod provider;
pub mod source;

pub use cache::{CachedQuote, RateCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::RatesError;
pub use parse::RawQuote;
pub use provider::{ExchangeRateProvider, RateQuote, RatesConfig, DEFAULT_BUY, DEFAULT_SELL};
pub use source::{HttpRateSource, RateSource};
