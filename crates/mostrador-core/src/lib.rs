//! # mostrador-core: Pure Business Logic for Mostrador
//!
//! This crate holds the pricing, proration and validation rules of the
//! back-office as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mostrador Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (axum)                              │   │
//! │  │    /sales, /orders, /products, /categories, /customers ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ mostrador-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌────────┐ │   │
//! │  │   │  money  │ │ pricing │ │proration │ │validation│ │lenient │ │   │
//! │  │   │ Money   │ │ margin  │ │ shipping │ │  rules   │ │ inputs │ │   │
//! │  │   │ Pesos   │ │ U$→AR$  │ │ per line │ │  checks  │ │  → 0   │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └──────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 mostrador-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, Sale, Customer, ...)
//! - [`money`] - Integer money types: USD cents, ARS pesos, margins, rates
//! - [`pricing`] - Sale price calculator (margin, rounding, conversion)
//! - [`proration`] - Shipping cost distribution across purchase lines
//! - [`lenient`] - Numeric input parsing that degrades to zero
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use mostrador_core::money::{ExchangeRate, Margin, Money};
//! use mostrador_core::pricing::{ars_sale_price, usd_sale_price};
//!
//! let cost = Money::from_cents(1000); // U$ 10,00
//! let usd = usd_sale_price(cost, Margin::from_bps(2000)); // 20%
//! assert_eq!(usd.cents(), 1200);
//!
//! let ars = ars_sale_price(usd, ExchangeRate::from_hundredths(125_000)); // 1250,00
//! assert_eq!(ars.amount(), 15_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lenient;
pub mod money;
pub mod pricing;
pub mod proration;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ProrationError, ValidationError};
pub use money::{ExchangeRate, Margin, Money, Pesos};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tenant used when a request does not name one.
///
/// Every table carries `tenant_id`; single-store deployments never send the
/// tenant header and land here.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum line items in a single sale or purchase order.
pub const MAX_LINE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Global margin applied when the settings row has never been written (30%).
pub const DEFAULT_MARGIN_BPS: u32 = 3_000;
