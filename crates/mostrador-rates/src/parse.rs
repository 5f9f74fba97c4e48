//! # Payload Parsing
//!
//! Two payload shapes are accepted, both as a JSON array:
//!
//! ```text
//! flat:    [{ "casa": "blue", "nombre": "Blue", "compra": 1180, "venta": 1230 }, ...]
//! nested:  [{ "casa": { "nombre": "Dolar Blue", "compra": "1.180,00", "venta": "1.230,00" } }, ...]
//! ```
//!
//! Quote selection is a case-insensitive substring match on the record's
//! labels (`nombre`, and `casa` when it is a string). Numbers may be JSON
//! numbers or locale strings.

use mostrador_core::{lenient, ExchangeRate};
use serde_json::Value;

use crate::error::RatesError;

/// One record from the source, numbers not yet interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
    pub labels: Vec<String>,
    pub buy: Value,
    pub sell: Value,
}

impl RawQuote {
    fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        !needle.is_empty() && self.labels.iter().any(|l| l.to_lowercase().contains(&needle))
    }
}

/// Splits a payload into records.
pub fn records(payload: &Value) -> Result<Vec<RawQuote>, RatesError> {
    let entries = payload
        .as_array()
        .ok_or_else(|| RatesError::InvalidPayload("expected a JSON array".to_string()))?;

    Ok(entries.iter().filter_map(record).collect())
}

fn record(entry: &Value) -> Option<RawQuote> {
    let obj = match entry.get("casa") {
        Some(inner @ Value::Object(_)) => inner,
        _ => entry,
    };
    let obj = obj.as_object()?;

    let mut labels = Vec::new();
    for key in ["nombre", "casa"] {
        if let Some(Value::String(label)) = obj.get(key) {
            labels.push(label.clone());
        }
    }
    if labels.is_empty() {
        return None;
    }

    Some(RawQuote {
        labels,
        buy: obj.get("compra").cloned().unwrap_or(Value::Null),
        sell: obj.get("venta").cloned().unwrap_or(Value::Null),
    })
}

/// Picks the `target` quote, falling back to `fallback`, and reads its
/// buy/sell pair.
pub fn select(
    records: &[RawQuote],
    target: &str,
    fallback: &str,
) -> Result<(ExchangeRate, ExchangeRate), RatesError> {
    let found = records
        .iter()
        .find(|r| r.matches(target))
        .or_else(|| records.iter().find(|r| r.matches(fallback)))
        .ok_or_else(|| RatesError::QuoteNotFound {
            target: target.to_string(),
            fallback: fallback.to_string(),
        })?;

    Ok((rate_value("compra", &found.buy)?, rate_value("venta", &found.sell)?))
}

fn rate_value(field: &str, value: &Value) -> Result<ExchangeRate, RatesError> {
    let parsed = match value {
        Value::Number(n) => {
            lenient::parse_scaled(&n.to_string(), 2).map(ExchangeRate::from_hundredths)
        }
        Value::String(s) => parse_locale_number(s),
        _ => None,
    };

    parsed
        .filter(|r| r.is_positive())
        .ok_or_else(|| RatesError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Reads a locale-formatted rate.
///
/// Follows [`lenient::parse_locale_scaled`], with one addition for quote
/// payloads: without a comma, a single dot followed by exactly three
/// digits groups thousands (`"1.230"`), since rates never carry three
/// decimals.
///
/// ## Example
/// ```rust
/// use mostrador_rates::parse::parse_locale_number;
///
/// assert_eq!(parse_locale_number("1.234,56").map(|r| r.hundredths()), Some(123_456));
/// assert_eq!(parse_locale_number("1.230").map(|r| r.hundredths()), Some(123_000));
/// assert_eq!(parse_locale_number("1230.5").map(|r| r.hundredths()), Some(123_050));
/// assert_eq!(parse_locale_number("n/a"), None);
/// ```
pub fn parse_locale_number(input: &str) -> Option<ExchangeRate> {
    let s = input.trim();
    let thousands_dot = !s.contains(',')
        && s.matches('.').count() == 1
        && s.rsplit('.')
            .next()
            .is_some_and(|tail| tail.len() == 3 && tail.chars().all(|c| c.is_ascii_digit()));

    let hundredths = if thousands_dot {
        lenient::parse_scaled(&s.replace('.', ""), 2)
    } else {
        lenient::parse_locale_scaled(s, 2)
    };
    hundredths.map(ExchangeRate::from_hundredths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hundredths(pair: (ExchangeRate, ExchangeRate)) -> (i64, i64) {
        (pair.0.hundredths(), pair.1.hundredths())
    }

    #[test]
    fn test_flat_payload() {
        let payload = json!([
            { "casa": "oficial", "nombre": "Oficial", "compra": 1050, "venta": 1090.5 },
            { "casa": "blue", "nombre": "Blue", "compra": 1180, "venta": 1230 }
        ]);
        let recs = records(&payload).unwrap();
        assert_eq!(hundredths(select(&recs, "blue", "oficial").unwrap()), (118_000, 123_000));
    }

    #[test]
    fn test_nested_payload_with_locale_strings() {
        let payload = json!([
            { "casa": { "nombre": "Dolar Oficial", "compra": "1.050,00", "venta": "1.090,50" } },
            { "casa": { "nombre": "Dolar Blue", "compra": "1.180,00", "venta": "1.230,00" } }
        ]);
        let recs = records(&payload).unwrap();
        assert_eq!(hundredths(select(&recs, "BLUE", "oficial").unwrap()), (118_000, 123_000));
    }

    #[test]
    fn test_falls_back_to_secondary_label() {
        let payload = json!([
            { "casa": { "nombre": "Dolar Oficial", "compra": "1.050,00", "venta": "1.090,50" } }
        ]);
        let recs = records(&payload).unwrap();
        assert_eq!(hundredths(select(&recs, "blue", "oficial").unwrap()), (105_000, 109_050));
    }

    #[test]
    fn test_missing_quote() {
        let payload = json!([{ "casa": "tarjeta", "compra": 1, "venta": 2 }]);
        let recs = records(&payload).unwrap();
        assert!(matches!(
            select(&recs, "blue", "oficial"),
            Err(RatesError::QuoteNotFound { .. })
        ));
    }

    #[test]
    fn test_unparsable_or_zero_number() {
        let recs = records(&json!([{ "nombre": "Blue", "compra": "No Cotiza", "venta": "1.230,00" }]))
            .unwrap();
        assert!(matches!(
            select(&recs, "blue", "oficial"),
            Err(RatesError::InvalidNumber { ref field, .. }) if field == "compra"
        ));

        let recs = records(&json!([{ "nombre": "Blue", "compra": "1.180,00", "venta": 0 }])).unwrap();
        assert!(select(&recs, "blue", "oficial").is_err());
    }

    #[test]
    fn test_non_array_payload() {
        assert!(matches!(
            records(&json!({ "blue": 1230 })),
            Err(RatesError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_entries_without_labels_are_skipped() {
        let recs = records(&json!([{ "compra": 1, "venta": 2 }, "junk", { "nombre": "Blue" }])).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].sell, Value::Null);
    }
}
