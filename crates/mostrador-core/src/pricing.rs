//! # Pricing
//!
//! Deterministic price transformations: cost → USD sale price → ARS sale
//! price.
//!
//! ## Price Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  category.profit_margin ──┐                                             │
//! │                           ├─► margin_for() ──► Margin                   │
//! │  settings.default_margin ─┘                       │                     │
//! │                                                   ▼                     │
//! │  product.cost ────────────────────────► usd_sale_price()                │
//! │                                         cost × (1 + margin)             │
//! │                                         nearest 0.50 (half away)        │
//! │                                                   │                     │
//! │  exchange rate (sell) ─────────────────► ars_sale_price()               │
//! │                                         usd × rate                      │
//! │                                         UP to next multiple of 500      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Neither function can fail. Callers that hold raw JSON go through
//! [`crate::lenient`] first, so malformed input prices as zero.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{format_ars, format_usd, ExchangeRate, Margin, Money, Pesos};

/// USD prices snap to this many cents.
pub const USD_STEP_CENTS: i64 = 50;

/// ARS prices round up to a multiple of this many pesos.
pub const ARS_STEP_PESOS: i64 = 500;

// =============================================================================
// Margin Selection
// =============================================================================

/// Returns the category margin when one is set, else the global default.
///
/// ## Example
/// ```rust
/// use mostrador_core::money::Margin;
/// use mostrador_core::pricing::margin_for;
///
/// let global = Margin::from_bps(3000);
/// assert_eq!(margin_for(Some(Margin::from_bps(2000)), global).bps(), 2000);
/// assert_eq!(margin_for(None, global).bps(), 3000);
/// ```
#[inline]
pub fn margin_for(category_margin: Option<Margin>, global_default: Margin) -> Margin {
    category_margin.unwrap_or(global_default)
}

// =============================================================================
// Price Calculation
// =============================================================================

/// `base_cost × (1 + margin)`, rounded to the nearest 0.50.
///
/// ## Rounding Rule
/// ```text
/// value × 2  →  round half away from zero  →  ÷ 2
///
///   9.30 × 2 = 18.6 → 19 → 9.50
///   9.20 × 2 = 18.4 → 18 → 9.00
///   9.25 × 2 = 18.5 → 19 → 9.50
/// ```
///
/// `cents × (10000 + bps)` is the price in units of 1/1,000,000 dollar,
/// so one half-dollar step is 500,000 of those units.
pub fn usd_sale_price(base_cost: Money, margin: Margin) -> Money {
    let scaled = base_cost.cents() as i128 * (Margin::MAX_BPS as i128 + margin.bps() as i128);
    let steps = div_round_half_away(scaled, 500_000);
    Money::from_cents((steps * USD_STEP_CENTS as i128) as i64)
}

/// `usd × rate`, rounded UP to the next multiple of 500 pesos.
///
/// Non-positive products clamp to zero.
///
/// ## Example
/// ```rust
/// use mostrador_core::money::{ExchangeRate, Money};
/// use mostrador_core::pricing::ars_sale_price;
///
/// // U$ 12,00 × 1250,00 = 15.000 (already a multiple of 500)
/// let ars = ars_sale_price(Money::from_cents(1200), ExchangeRate::from_hundredths(125_000));
/// assert_eq!(ars.amount(), 15_000);
/// ```
pub fn ars_sale_price(usd: Money, rate: ExchangeRate) -> Pesos {
    // cents × hundredths = pesos × 10,000
    let scaled = usd.cents() as i128 * rate.hundredths() as i128;
    if scaled <= 0 {
        return Pesos::zero();
    }
    let step = ARS_STEP_PESOS as i128 * 10_000;
    let steps = (scaled + step - 1) / step;
    Pesos::new((steps * ARS_STEP_PESOS as i128) as i64)
}

/// Rounds an ARS amount up to a multiple of 500. Non-positive → 0.
pub fn round_up_ars(amount: Pesos) -> Pesos {
    if amount.amount() <= 0 {
        return Pesos::zero();
    }
    let step = ARS_STEP_PESOS;
    Pesos::new((amount.amount() + step - 1) / step * step)
}

fn div_round_half_away(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        -((-numerator + half) / denominator)
    }
}

// =============================================================================
// Price Source
// =============================================================================

/// Where a sale line's price comes from.
///
/// The back-office lets the operator type a price over the computed one.
/// Sale handlers accept the override as-is; this type makes that trust
/// boundary visible at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource<T> {
    /// Use the calculator's output.
    Computed,
    /// Operator-entered value, taken verbatim.
    Overridden(T),
}

impl<T> PriceSource<T> {
    /// `Some(v)` → `Overridden(v)`, `None` → `Computed`.
    pub fn from_override(value: Option<T>) -> Self {
        match value {
            Some(v) => PriceSource::Overridden(v),
            None => PriceSource::Computed,
        }
    }

    /// Returns the override, or `computed` when there is none.
    pub fn resolve(self, computed: T) -> T {
        match self {
            PriceSource::Computed => computed,
            PriceSource::Overridden(v) => v,
        }
    }

    pub fn is_overridden(&self) -> bool {
        matches!(self, PriceSource::Overridden(_))
    }
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// Full price breakdown for one product, as shown on the catalog screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    pub cost: Money,
    pub margin: Margin,
    pub usd_price: Money,
    pub ars_price: Pesos,
    pub exchange_rate: ExchangeRate,
    pub usd_formatted: String,
    pub ars_formatted: String,
}

/// Prices a product from its cost, effective margin and the sell rate.
pub fn price_breakdown(cost: Money, margin: Margin, rate: ExchangeRate) -> PriceBreakdown {
    let usd_price = usd_sale_price(cost, margin);
    let ars_price = ars_sale_price(usd_price, rate);
    PriceBreakdown {
        cost,
        margin,
        usd_price,
        ars_price,
        exchange_rate: rate,
        usd_formatted: format_usd(usd_price),
        ars_formatted: format_ars(ars_price),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(cents: i64, bps: u32) -> i64 {
        usd_sale_price(Money::from_cents(cents), Margin::from_bps(bps)).cents()
    }

    #[test]
    fn test_usd_rounds_to_nearest_half() {
        assert_eq!(usd(930, 0), 950);
        assert_eq!(usd(920, 0), 900);
        assert_eq!(usd(925, 0), 950);
        assert_eq!(usd(975, 0), 1000);
        assert_eq!(usd(0, 3000), 0);
    }

    #[test]
    fn test_usd_applies_margin() {
        // 10.00 × 1.2 = 12.00
        assert_eq!(usd(1000, 2000), 1200);
        // 7.77 × 1.3 = 10.101 → 10.00
        assert_eq!(usd(777, 3000), 1000);
        // 3.90 × 1.5 = 5.85 → 6.00
        assert_eq!(usd(390, 5000), 600);
    }

    #[test]
    fn test_usd_negative_rounds_away_from_zero() {
        assert_eq!(usd(-925, 0), -950);
        assert_eq!(usd(-920, 0), -900);
    }

    #[test]
    fn test_usd_properties_over_grid() {
        for cents in (0..5_000).step_by(7) {
            for bps in [0, 1, 1500, 2000, 3333, 5000, 10_000] {
                let price = usd(cents, bps);
                assert_eq!(price % USD_STEP_CENTS, 0, "cost {cents} margin {bps}");

                // never more than a quarter away from the exact value
                let exact = cents as i128 * (10_000 + bps as i128);
                let diff = (price as i128 * 10_000 - exact).abs();
                assert!(diff <= 25 * 10_000, "cost {cents} margin {bps} gave {price}");

                // once the markup covers the rounding slack the price stays above cost
                if exact - cents as i128 * 10_000 >= 25 * 10_000 {
                    assert!(price >= cents, "cost {cents} margin {bps} gave {price}");
                }
            }
        }
    }

    fn ars(cents: i64, hundredths: i64) -> i64 {
        ars_sale_price(
            Money::from_cents(cents),
            ExchangeRate::from_hundredths(hundredths),
        )
        .amount()
    }

    #[test]
    fn test_ars_rounds_up_to_500() {
        // rate 1.00 makes usd cents map straight to pesos × 100
        assert_eq!(ars(1_230_000, 100), 12_500);
        assert_eq!(ars(1_250_000, 100), 12_500);
        assert_eq!(ars(1_250_100, 100), 13_000);
        assert_eq!(ars(1200, 125_000), 15_000);
    }

    #[test]
    fn test_ars_clamps_non_positive() {
        assert_eq!(ars(0, 125_000), 0);
        assert_eq!(ars(-1000, 125_000), 0);
        assert_eq!(ars(1000, 0), 0);
    }

    #[test]
    fn test_ars_properties_over_grid() {
        for cents in (0..10_000).step_by(13) {
            for rate in [1, 100, 118_000, 123_050, 125_000] {
                let price = ars(cents, rate);
                assert_eq!(price % ARS_STEP_PESOS, 0);
                assert!(price as i128 * 10_000 >= cents as i128 * rate as i128);
            }
        }
    }

    #[test]
    fn test_ars_idempotent_on_multiples_of_500() {
        let once = round_up_ars(Pesos::new(12_301));
        assert_eq!(once.amount(), 12_500);
        assert_eq!(round_up_ars(once), once);

        let rate_one = ExchangeRate::from_hundredths(100);
        let first = ars_sale_price(Money::from_cents(1_230_000), rate_one);
        let again = ars_sale_price(Money::from_cents(first.amount() * 100), rate_one);
        assert_eq!(first, again);
    }

    #[test]
    fn test_price_source() {
        let computed = Money::from_cents(1200);
        assert_eq!(PriceSource::Computed.resolve(computed), computed);
        assert_eq!(
            PriceSource::Overridden(Money::from_cents(999)).resolve(computed),
            Money::from_cents(999)
        );
        assert!(PriceSource::from_override(Some(1)).is_overridden());
        assert_eq!(PriceSource::<i64>::from_override(None), PriceSource::Computed);
    }

    #[test]
    fn test_price_breakdown_scenario() {
        // cost 10.00, margin 0.2, sell 1250.00
        let breakdown = price_breakdown(
            Money::from_cents(1000),
            Margin::from_bps(2000),
            ExchangeRate::from_hundredths(125_000),
        );
        assert_eq!(breakdown.usd_price.cents(), 1200);
        assert_eq!(breakdown.ars_price.amount(), 15_000);
        assert_eq!(breakdown.usd_formatted, "U$ 12,00");
        assert_eq!(breakdown.ars_formatted, "AR$ 15.000");
    }
}
