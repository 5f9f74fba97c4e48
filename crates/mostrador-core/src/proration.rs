//! # Shipping Proration
//!
//! A purchase order arrives with one shared shipping charge. Each line
//! carries a share of it proportional to its cost, and the landed unit
//! cost becomes the product's new price.
//!
//! ## Worked Example
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  shipping: U$ 20,00                                                     │
//! │                                                                         │
//! │  LINE      QTY   COST    LINE COST   SHARE    PRORATED   UNIT+SHIP      │
//! │  ───────   ───   ─────   ─────────   ─────    ────────   ─────────      │
//! │  A          10   2,00    20,00       50%      10,00      3,00           │
//! │  B           5   4,00    20,00       50%      10,00      6,00           │
//! │                          ─────────            ────────                  │
//! │                          40,00                20,00  == shipping        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exact Allocation
//! Shares are computed in cents with the largest-remainder method: every
//! line gets the floor of its exact share, then the leftover cents go to
//! the lines with the largest fractional remainders (earlier lines win
//! ties). The prorated column therefore always sums to the shipping cost.

use crate::error::ProrationError;
use crate::money::Money;

// =============================================================================
// Types
// =============================================================================

/// One purchase line as far as proration is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProrationLine {
    pub quantity: i64,
    /// Unit cost before shipping.
    pub cost: Money,
}

impl ProrationLine {
    pub fn new(quantity: i64, cost: Money) -> Self {
        Self { quantity, cost }
    }

    /// `quantity × cost`.
    pub fn line_cost(&self) -> Money {
        self.cost.multiply_quantity(self.quantity)
    }
}

/// Result for one line, in the same order as the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProratedLine {
    pub line_cost: Money,
    pub prorated_shipping: Money,
    /// `line_cost + prorated_shipping`.
    pub total_cost: Money,
    /// Unit cost plus this line's per-unit shipping share; zero when the
    /// quantity is zero.
    pub unit_cost_with_shipping: Money,
    /// `(unit_cost_with_shipping - cost) × quantity`, the shipping amount
    /// recorded against the purchase record.
    pub shipping_delta: Money,
}

// =============================================================================
// Proration
// =============================================================================

/// Distributes `shipping` across `lines` proportionally to line cost.
///
/// ## Errors
/// - [`ProrationError::EmptyOrder`] when `lines` is empty
/// - [`ProrationError::ZeroProductCost`] when Σ quantity × cost is not
///   positive
///
/// ## Example
/// ```rust
/// use mostrador_core::money::Money;
/// use mostrador_core::proration::{prorate, ProrationLine};
///
/// let lines = [
///     ProrationLine::new(10, Money::from_cents(200)),
///     ProrationLine::new(5, Money::from_cents(400)),
/// ];
/// let result = prorate(&lines, Money::from_cents(2000)).unwrap();
/// assert_eq!(result[0].unit_cost_with_shipping.cents(), 300);
/// assert_eq!(result[1].unit_cost_with_shipping.cents(), 600);
/// ```
pub fn prorate(lines: &[ProrationLine], shipping: Money) -> Result<Vec<ProratedLine>, ProrationError> {
    if lines.is_empty() {
        return Err(ProrationError::EmptyOrder);
    }

    let line_costs: Vec<i128> = lines
        .iter()
        .map(|l| l.quantity as i128 * l.cost.cents() as i128)
        .collect();
    let total: i128 = line_costs.iter().sum();
    if total <= 0 {
        return Err(ProrationError::ZeroProductCost);
    }

    let shipping_cents = shipping.cents() as i128;
    let mut shares = Vec::with_capacity(lines.len());
    let mut remainders = Vec::with_capacity(lines.len());
    for (idx, line_cost) in line_costs.iter().enumerate() {
        let exact = line_cost * shipping_cents;
        shares.push(exact.div_euclid(total));
        remainders.push((exact.rem_euclid(total), idx));
    }

    let allocated: i128 = shares.iter().sum();
    let leftover = (shipping_cents - allocated) as usize;
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, idx) in remainders.iter().take(leftover) {
        shares[idx] += 1;
    }

    Ok(lines
        .iter()
        .zip(shares)
        .map(|(line, share)| build_line(line, Money::from_cents(share as i64)))
        .collect())
}

fn build_line(line: &ProrationLine, prorated_shipping: Money) -> ProratedLine {
    let line_cost = line.line_cost();
    let unit_cost_with_shipping = if line.quantity == 0 {
        Money::zero()
    } else {
        let per_unit = div_round_half_away(prorated_shipping.cents(), line.quantity);
        line.cost + Money::from_cents(per_unit)
    };
    let shipping_delta = (unit_cost_with_shipping - line.cost).multiply_quantity(line.quantity);

    ProratedLine {
        line_cost,
        prorated_shipping,
        total_cost: line_cost + prorated_shipping,
        unit_cost_with_shipping,
        shipping_delta,
    }
}

fn div_round_half_away(numerator: i64, denominator: i64) -> i64 {
    let (n, d) = (numerator as i128, denominator as i128);
    let sign = if (n < 0) != (d < 0) { -1 } else { 1 };
    let (n, d) = (n.abs(), d.abs());
    (sign * ((n + d / 2) / d)) as i64
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, cents: i64) -> ProrationLine {
        ProrationLine::new(quantity, Money::from_cents(cents))
    }

    #[test]
    fn test_two_equal_lines() {
        let result = prorate(&[line(10, 200), line(5, 400)], Money::from_cents(2000)).unwrap();

        assert_eq!(result[0].line_cost.cents(), 2000);
        assert_eq!(result[0].prorated_shipping.cents(), 1000);
        assert_eq!(result[0].total_cost.cents(), 3000);
        assert_eq!(result[0].unit_cost_with_shipping.cents(), 300);
        assert_eq!(result[0].shipping_delta.cents(), 1000);

        assert_eq!(result[1].prorated_shipping.cents(), 1000);
        assert_eq!(result[1].unit_cost_with_shipping.cents(), 600);
    }

    #[test]
    fn test_leftover_cents_follow_largest_remainder() {
        // 10.00 over three equal lines: 3.34 / 3.33 / 3.33
        let result = prorate(&[line(1, 100), line(1, 100), line(1, 100)], Money::from_cents(1000))
            .unwrap();
        let shares: Vec<i64> = result.iter().map(|r| r.prorated_shipping.cents()).collect();
        assert_eq!(shares, vec![334, 333, 333]);

        // 1 cent over 1:2 → the larger line wins (remainder 2/3 vs 1/3)
        let result = prorate(&[line(1, 100), line(1, 200)], Money::from_cents(1)).unwrap();
        assert_eq!(result[0].prorated_shipping.cents(), 0);
        assert_eq!(result[1].prorated_shipping.cents(), 1);
    }

    #[test]
    fn test_sums_are_exact() {
        let lines = [line(3, 1999), line(7, 45), line(1, 12_345), line(13, 1)];
        for shipping in [0, 1, 99, 1000, 12_345, 987_654] {
            let result = prorate(&lines, Money::from_cents(shipping)).unwrap();

            let prorated: Money = result.iter().map(|r| r.prorated_shipping).sum();
            assert_eq!(prorated.cents(), shipping);

            let totals: Money = result.iter().map(|r| r.total_cost).sum();
            let line_costs: Money = result.iter().map(|r| r.line_cost).sum();
            assert_eq!(totals, line_costs + Money::from_cents(shipping));
        }
    }

    #[test]
    fn test_zero_total_cost_rejected() {
        assert_eq!(
            prorate(&[line(5, 0), line(2, 0)], Money::from_cents(1000)),
            Err(ProrationError::ZeroProductCost)
        );
        assert_eq!(
            prorate(&[line(0, 500)], Money::from_cents(1000)),
            Err(ProrationError::ZeroProductCost)
        );
    }

    #[test]
    fn test_empty_order_rejected() {
        assert_eq!(prorate(&[], Money::from_cents(1000)), Err(ProrationError::EmptyOrder));
    }

    #[test]
    fn test_zero_quantity_line_has_zero_unit_cost() {
        let result = prorate(&[line(0, 500), line(2, 500)], Money::from_cents(300)).unwrap();
        assert_eq!(result[0].prorated_shipping.cents(), 0);
        assert_eq!(result[0].unit_cost_with_shipping.cents(), 0);
        assert_eq!(result[1].prorated_shipping.cents(), 300);
        assert_eq!(result[1].unit_cost_with_shipping.cents(), 650);
    }

    #[test]
    fn test_unit_share_rounds_half_away() {
        // 1.00 shipping over 3 units → 33.33 per unit → 33
        let result = prorate(&[line(3, 100)], Money::from_cents(100)).unwrap();
        assert_eq!(result[0].unit_cost_with_shipping.cents(), 133);
        assert_eq!(result[0].shipping_delta.cents(), 99);

        // 0.05 over 2 units → 2.5 → 3
        let result = prorate(&[line(2, 100)], Money::from_cents(5)).unwrap();
        assert_eq!(result[0].unit_cost_with_shipping.cents(), 103);
    }
}
