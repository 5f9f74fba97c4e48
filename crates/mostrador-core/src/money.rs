//! # Money Module
//!
//! Integer representations of every numeric business value.
//!
//! ## Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TYPE           UNIT                      JSON            STORED        │
//! │  ───────────    ───────────────────────   ─────────────   ───────────   │
//! │  Money          USD cents                 12.5            1250          │
//! │  Pesos          whole ARS pesos           15000           15000         │
//! │  Margin         basis points (1/10000)    0.2             2000          │
//! │  ExchangeRate   hundredths of a peso/USD  1185.5          118550        │
//! │                                                                         │
//! │  JSON carries decimals, everything below the HTTP boundary is i64.     │
//! │  Products of two values are computed in i128.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mostrador_core::money::{format_ars, format_usd, Money, Pesos};
//!
//! let price = Money::from_cents(123_450);
//! assert_eq!(format_usd(price), "U$ 1.234,50");
//! assert_eq!(format_ars(Pesos::new(15_000)), "AR$ 15.000");
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::lenient;

// =============================================================================
// Money (USD)
// =============================================================================

/// A USD amount in cents.
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  Product.cost ──► usd_sale_price(margin) ──► SaleItem.selling_price    │
/// │                                                  │                      │
/// │                                                  └──► Sale.total        │
/// │                                                                         │
/// │  Order line cost + shipping ──► prorate ──► landed unit cost           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(#[ts(type = "number")] i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // U$ 10,99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses a decimal dollar string (`"10.99"`), rounding to the cent.
    pub fn parse(input: &str) -> Option<Self> {
        lenient::parse_scaled(input, 2).map(Money)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(950); // U$ 9,50
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 2850);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Dollar value as a float, for JSON output only.
    #[inline]
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_usd(*self))
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_scaled(deserializer, 2, "amount").map(Money)
    }
}

// =============================================================================
// Pesos (ARS)
// =============================================================================

/// An ARS amount in whole pesos.
///
/// Local prices are always displayed as integers; the only producer of
/// sale prices is [`crate::pricing::ars_sale_price`], which returns
/// multiples of 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Pesos(#[ts(type = "number")] i64);

impl Pesos {
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Pesos(amount)
    }

    /// Parses a decimal peso string, rounding to the whole peso.
    pub fn parse(input: &str) -> Option<Self> {
        lenient::parse_scaled(input, 0).map(Pesos)
    }

    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Pesos(0)
    }

    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Pesos(self.0 * qty)
    }
}

impl fmt::Display for Pesos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_ars(*self))
    }
}

impl Add for Pesos {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Pesos(self.0 + other.0)
    }
}

impl AddAssign for Pesos {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sum for Pesos {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Pesos::zero(), |acc, p| acc + p)
    }
}

impl Serialize for Pesos {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Pesos {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_scaled(deserializer, 0, "amount").map(Pesos)
    }
}

// =============================================================================
// Margin
// =============================================================================

/// A profit margin in basis points (10000 = 100%).
///
/// ## Why Basis Points?
/// Margins arrive as fractions (`0.2`) and multiply cents. Four decimal
/// places cover every margin an operator types, and the product
/// `cents × (10000 + bps)` stays exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Margin(#[ts(type = "number")] u32);

impl Margin {
    /// 100% expressed in basis points.
    pub const MAX_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Margin(bps)
    }

    /// Parses a fractional margin string (`"0.25"`).
    ///
    /// Returns `None` for non-numbers and for values outside `[0, 1]`.
    pub fn parse(input: &str) -> Option<Self> {
        lenient::parse_scaled(input, 4).and_then(Margin::try_from_bps_i64)
    }

    /// Accepts a signed basis-point value only if it lies in `[0, 10000]`.
    pub fn try_from_bps_i64(bps: i64) -> Option<Self> {
        if (0..=Self::MAX_BPS as i64).contains(&bps) {
            Some(Margin(bps as u32))
        } else {
            None
        }
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Margin(0)
    }

    /// Fractional value, for JSON output only.
    #[inline]
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }
}

impl Serialize for Margin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Margin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bps = deserialize_scaled(deserializer, 4, "margin")?;
        Margin::try_from_bps_i64(bps)
            .ok_or_else(|| D::Error::custom("margin must be between 0 and 1"))
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// ARS per USD, in hundredths of a peso.
///
/// `1185.50` pesos per dollar is stored as `118550`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct ExchangeRate(#[ts(type = "number")] i64);

impl ExchangeRate {
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        ExchangeRate(hundredths)
    }

    /// Parses a plain decimal rate (`"1185.5"`).
    pub fn parse(input: &str) -> Option<Self> {
        lenient::parse_scaled(input, 2).map(ExchangeRate)
    }

    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for ExchangeRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for ExchangeRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_scaled(deserializer, 2, "exchange rate").map(ExchangeRate)
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Formats a USD amount as `U$ 1.234,50`.
///
/// Two decimals, `.` for thousands and `,` for decimals (es-AR).
pub fn format_usd(amount: Money) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    let abs = amount.cents().unsigned_abs();
    format!("U$ {}{},{:02}", sign, group_thousands(abs / 100), abs % 100)
}

/// Formats an ARS amount as `AR$ 15.000`.
pub fn format_ars(amount: Pesos) -> String {
    let sign = if amount.amount() < 0 { "-" } else { "" };
    format!("AR$ {}{}", sign, group_thousands(amount.amount().unsigned_abs()))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Serde Helpers
// =============================================================================

/// JSON numbers and numeric strings both deserialize into the scaled types.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

fn deserialize_scaled<'de, D: Deserializer<'de>>(
    deserializer: D,
    scale: u32,
    what: &str,
) -> Result<i64, D::Error> {
    let (raw, parsed) = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => {
            let raw = n.to_string();
            let parsed = lenient::parse_scaled(&raw, scale);
            (raw, parsed)
        }
        NumberOrString::String(s) => {
            let parsed = lenient::parse_locale_scaled(&s, scale);
            (s, parsed)
        }
    };
    parsed.ok_or_else(|| D::Error::custom(format!("invalid {}: {:?}", what, raw)))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(Money::from_cents(0)), "U$ 0,00");
        assert_eq!(format_usd(Money::from_cents(950)), "U$ 9,50");
        assert_eq!(format_usd(Money::from_cents(123_450)), "U$ 1.234,50");
        assert_eq!(format_usd(Money::from_cents(100_000_000)), "U$ 1.000.000,00");
        assert_eq!(format_usd(Money::from_cents(-550)), "U$ -5,50");
    }

    #[test]
    fn test_format_ars() {
        assert_eq!(format_ars(Pesos::new(0)), "AR$ 0");
        assert_eq!(format_ars(Pesos::new(500)), "AR$ 500");
        assert_eq!(format_ars(Pesos::new(15_000)), "AR$ 15.000");
        assert_eq!(format_ars(Pesos::new(1_234_500)), "AR$ 1.234.500");
    }

    #[test]
    fn test_formatting_is_stable() {
        let price = Money::from_cents(123_450);
        assert_eq!(format_usd(price), format_usd(price));
        assert_eq!(price.to_string(), format_usd(price));
        assert_eq!(Pesos::new(12_500).to_string(), "AR$ 12.500");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);

        let pesos: Pesos = [Pesos::new(500), Pesos::new(1000)].into_iter().sum();
        assert_eq!(pesos.amount(), 1500);
    }

    #[test]
    fn test_money_json_is_decimal() {
        let json = serde_json::to_string(&Money::from_cents(1250)).unwrap();
        assert_eq!(json, "12.5");

        let parsed: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(parsed.cents(), 1999);
        let parsed: Money = serde_json::from_str("\"7.5\"").unwrap();
        assert_eq!(parsed.cents(), 750);
        let parsed: Money = serde_json::from_str("\"1.234,50\"").unwrap();
        assert_eq!(parsed.cents(), 123_450);
        assert!(serde_json::from_str::<Money>("\"abc\"").is_err());
    }

    #[test]
    fn test_margin_bounds() {
        assert_eq!(Margin::parse("0.2"), Some(Margin::from_bps(2000)));
        assert_eq!(Margin::parse("1"), Some(Margin::from_bps(10_000)));
        assert_eq!(Margin::parse("1.01"), None);
        assert_eq!(Margin::parse("-0.1"), None);

        let m: Margin = serde_json::from_str("0.35").unwrap();
        assert_eq!(m.bps(), 3500);
        assert!(serde_json::from_str::<Margin>("2").is_err());
        assert_eq!(serde_json::to_string(&Margin::from_bps(2500)).unwrap(), "0.25");
    }

    #[test]
    fn test_exchange_rate() {
        let rate = ExchangeRate::parse("1185.5").unwrap();
        assert_eq!(rate.hundredths(), 118_550);
        assert_eq!(rate.to_string(), "1185.50");
        assert_eq!(serde_json::to_string(&rate).unwrap(), "1185.5");
        assert!(rate.is_positive());
    }
}
