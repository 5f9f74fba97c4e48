//! # Lenient Numeric Input
//!
//! Request bodies come from a hand-filled back-office form. Numbers arrive
//! as JSON numbers, numeric strings, empty strings, `null`, or not at all.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INPUT                  parse_scaled(.., 2)  money_or_zero  try_money   │
//! │  ────────────────────   ───────────────────  ─────────────  ─────────   │
//! │  12.5                   Some(1250)           1250           Ok(Some)    │
//! │  "12.5"  /  " 12.5 "    Some(1250)           1250           Ok(Some)    │
//! │  "12,50"                None                 1250           Ok(Some)    │
//! │  "1.234,56"             None                 123456         Ok(Some)    │
//! │  "1e2"                  Some(10000)          10000          Ok(Some)    │
//! │  null / missing         -                    0              Ok(None)    │
//! │  "" / "abc" / true      None                 0              Err         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! JSON strings go through [`parse_locale_scaled`], so the es-AR comma
//! decimal is accepted next to the plain dot form.
//!
//! Calculators use [`money_or_zero`] and never fail. Validation uses
//! the `try_*` family so a present-but-garbage field becomes a 400.

use serde_json::Value;

use crate::error::ValidationError;
use crate::money::{Margin, Money, Pesos};

// =============================================================================
// String Parsing
// =============================================================================

/// Parses a decimal string into an integer scaled by `10^scale`.
///
/// Plain decimals are parsed exactly; extra fractional digits round half
/// away from zero. Strings with an exponent go through `f64`.
///
/// ## Example
/// ```rust
/// use mostrador_core::lenient::parse_scaled;
///
/// assert_eq!(parse_scaled("12.345", 2), Some(1235));
/// assert_eq!(parse_scaled("-0.5", 0), Some(-1));
/// assert_eq!(parse_scaled("12,5", 2), None);
/// ```
pub fn parse_scaled(input: &str, scale: u32) -> Option<i64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if s.contains(['e', 'E']) {
        return parse_scaled_float(s, scale);
    }

    let (negative, unsigned) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let mut value: i128 = 0;
    for b in int_part.bytes() {
        value = value.checked_mul(10)?.checked_add((b - b'0') as i128)?;
    }
    let frac = frac_part.as_bytes();
    for i in 0..scale as usize {
        let digit = frac.get(i).map(|b| (b - b'0') as i128).unwrap_or(0);
        value = value.checked_mul(10)?.checked_add(digit)?;
    }
    if frac.get(scale as usize).is_some_and(|b| *b >= b'5') {
        value += 1;
    }

    let value = if negative { -value } else { value };
    i64::try_from(value).ok()
}

fn parse_scaled_float(s: &str, scale: u32) -> Option<i64> {
    let v: f64 = s.parse().ok()?;
    if !v.is_finite() {
        return None;
    }
    let scaled = (v * 10f64.powi(scale as i32)).round();
    if scaled.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(scaled as i64)
}

/// Parses a whole number; `"3"` and `"3.0"` are accepted, `"2.5"` is not.
pub fn parse_integer(input: &str) -> Option<i64> {
    let hundredths = parse_scaled(input, 2)?;
    if hundredths % 100 == 0 {
        Some(hundredths / 100)
    } else {
        None
    }
}

/// Parses a decimal typed the es-AR way or the plain way.
///
/// - A comma is the decimal point and every `.` groups thousands
///   (`"1.234,56"`, `"0,25"`).
/// - Without a comma, several dots are grouping (`"1.234.567"`) and a
///   single dot is the decimal point (`"12.5"`).
///
/// ## Example
/// ```rust
/// use mostrador_core::lenient::parse_locale_scaled;
///
/// assert_eq!(parse_locale_scaled("1.234,56", 2), Some(123_456));
/// assert_eq!(parse_locale_scaled("0,25", 4), Some(2_500));
/// assert_eq!(parse_locale_scaled("12.5", 2), Some(1_250));
/// assert_eq!(parse_locale_scaled("1.234.567", 0), Some(1_234_567));
/// assert_eq!(parse_locale_scaled("1,2,3", 2), None);
/// ```
pub fn parse_locale_scaled(input: &str, scale: u32) -> Option<i64> {
    let s = input.trim();
    if s.contains(',') {
        if s.matches(',').count() > 1 {
            return None;
        }
        return parse_scaled(&s.replace('.', "").replace(',', "."), scale);
    }
    if s.matches('.').count() > 1 {
        return parse_scaled(&s.replace('.', ""), scale);
    }
    parse_scaled(s, scale)
}

// =============================================================================
// JSON Value Parsing
// =============================================================================

/// Extracts a scaled integer from a JSON value (number or numeric string).
/// Strings may use either decimal convention, see [`parse_locale_scaled`].
pub fn scaled_from_value(value: Option<&Value>, scale: u32) -> Option<i64> {
    match value? {
        Value::Number(n) => parse_scaled(&n.to_string(), scale),
        Value::String(s) => parse_locale_scaled(s, scale),
        _ => None,
    }
}

fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// USD amount, malformed or missing input is zero.
pub fn money_or_zero(value: Option<&Value>) -> Money {
    Money::from_cents(scaled_from_value(value, 2).unwrap_or(0))
}

fn try_quantity_value(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| parse_integer(&n.to_string())),
        Value::String(s) => parse_integer(s),
        _ => None,
    }
}

// =============================================================================
// Validating Variants
// =============================================================================

/// Optional USD amount: absent → `Ok(None)`, garbage → `NotANumber`.
pub fn try_money(field: &str, value: Option<&Value>) -> Result<Option<Money>, ValidationError> {
    if is_absent(value) {
        return Ok(None);
    }
    scaled_from_value(value, 2)
        .map(|c| Some(Money::from_cents(c)))
        .ok_or_else(|| ValidationError::not_a_number(field))
}

/// Optional ARS amount in whole pesos.
pub fn try_pesos(field: &str, value: Option<&Value>) -> Result<Option<Pesos>, ValidationError> {
    if is_absent(value) {
        return Ok(None);
    }
    scaled_from_value(value, 0)
        .map(|p| Some(Pesos::new(p)))
        .ok_or_else(|| ValidationError::not_a_number(field))
}

/// Optional margin in `[0, 1]`.
pub fn try_margin(field: &str, value: Option<&Value>) -> Result<Option<Margin>, ValidationError> {
    if is_absent(value) {
        return Ok(None);
    }
    let bps = scaled_from_value(value, 4).ok_or_else(|| ValidationError::not_a_number(field))?;
    Margin::try_from_bps_i64(bps)
        .map(Some)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 1,
        })
}

/// Optional whole number.
pub fn try_integer(field: &str, value: Option<&Value>) -> Result<Option<i64>, ValidationError> {
    if is_absent(value) {
        return Ok(None);
    }
    try_quantity_value(value)
        .map(Some)
        .ok_or_else(|| ValidationError::not_a_number(field))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_scaled_plain_decimals() {
        assert_eq!(parse_scaled("12", 2), Some(1200));
        assert_eq!(parse_scaled("12.5", 2), Some(1250));
        assert_eq!(parse_scaled(" 0.07 ", 2), Some(7));
        assert_eq!(parse_scaled(".5", 2), Some(50));
        assert_eq!(parse_scaled("5.", 2), Some(500));
        assert_eq!(parse_scaled("+3", 0), Some(3));
        assert_eq!(parse_scaled("-1.25", 2), Some(-125));
    }

    #[test]
    fn test_parse_scaled_rounds_extra_digits() {
        assert_eq!(parse_scaled("0.125", 2), Some(13));
        assert_eq!(parse_scaled("0.124", 2), Some(12));
        assert_eq!(parse_scaled("-0.125", 2), Some(-13));
        assert_eq!(parse_scaled("0.20001", 4), Some(2000));
    }

    #[test]
    fn test_parse_scaled_rejects_garbage() {
        assert_eq!(parse_scaled("", 2), None);
        assert_eq!(parse_scaled("   ", 2), None);
        assert_eq!(parse_scaled("abc", 2), None);
        assert_eq!(parse_scaled("1,5", 2), None);
        assert_eq!(parse_scaled("1.2.3", 2), None);
        assert_eq!(parse_scaled("-", 2), None);
        assert_eq!(parse_scaled(".", 2), None);
        assert_eq!(parse_scaled("NaN", 2), None);
        assert_eq!(parse_scaled("99999999999999999999999", 2), None);
    }

    #[test]
    fn test_parse_scaled_exponent() {
        assert_eq!(parse_scaled("1e2", 2), Some(10_000));
        assert_eq!(parse_scaled("2.5E-1", 2), Some(25));
        assert_eq!(parse_scaled("1e400", 2), None);
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("3"), Some(3));
        assert_eq!(parse_integer("3.0"), Some(3));
        assert_eq!(parse_integer("2.5"), None);
    }

    #[test]
    fn test_or_zero_never_fails() {
        assert_eq!(money_or_zero(Some(&json!(12.5))).cents(), 1250);
        assert_eq!(money_or_zero(Some(&json!("12.5"))).cents(), 1250);
        assert_eq!(money_or_zero(Some(&json!("oops"))).cents(), 0);
        assert_eq!(money_or_zero(Some(&json!(null))).cents(), 0);
        assert_eq!(money_or_zero(Some(&json!(true))).cents(), 0);
        assert_eq!(money_or_zero(None).cents(), 0);
    }

    #[test]
    fn test_comma_decimal_request_fields() {
        assert_eq!(
            try_money("cost", Some(&json!("2,00"))).unwrap(),
            Some(Money::from_cents(200))
        );
        assert_eq!(
            try_money("cost", Some(&json!("1.234,56"))).unwrap(),
            Some(Money::from_cents(123_456))
        );
        assert_eq!(
            try_margin("profit_margin", Some(&json!("0,25"))).unwrap(),
            Some(Margin::from_bps(2500))
        );
        assert_eq!(
            try_pesos("price_ars", Some(&json!("15.000,00"))).unwrap(),
            Some(Pesos::new(15_000))
        );
        assert_eq!(money_or_zero(Some(&json!("12,50"))).cents(), 1250);

        assert_eq!(
            try_margin("profit_margin", Some(&json!("0.125"))).unwrap(),
            Some(Margin::from_bps(1250))
        );
        assert!(try_money("cost", Some(&json!("1,2,3"))).is_err());
    }

    #[test]
    fn test_try_variants() {
        assert_eq!(try_money("cost", None).unwrap(), None);
        assert_eq!(try_money("cost", Some(&json!(null))).unwrap(), None);
        assert_eq!(
            try_money("cost", Some(&json!("2.00"))).unwrap(),
            Some(Money::from_cents(200))
        );
        assert!(matches!(
            try_money("cost", Some(&json!("two"))),
            Err(ValidationError::NotANumber { .. })
        ));

        assert!(matches!(
            try_margin("profit_margin", Some(&json!(1.5))),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(
            try_margin("profit_margin", Some(&json!("0.3"))).unwrap(),
            Some(Margin::from_bps(3000))
        );

        assert_eq!(try_integer("quantity", Some(&json!(5))).unwrap(), Some(5));
        assert!(try_integer("quantity", Some(&json!(2.5))).is_err());
        assert_eq!(
            try_pesos("ars_price", Some(&json!(15000))).unwrap(),
            Some(Pesos::new(15000))
        );
    }
}
