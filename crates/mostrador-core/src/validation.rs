//! # Validation Module
//!
//! Business rule validation for request payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (axum Json extractor)                        │
//! │  └── Shape only: numeric fields are raw JSON values                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + lenient::try_*                                 │
//! │  ├── Names, lengths, ranges                                            │
//! │  └── Runs for every line BEFORE any write                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  ├── UNIQUE (tenant_id, name)                                          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mostrador_core::validation::{validate_name, validate_quantity};
//!
//! let name = validate_name("name", "  Yerba 1kg ").unwrap();
//! assert_eq!(name, "Yerba 1kg");
//! assert!(validate_quantity("quantity", 0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::{MAX_ITEM_QUANTITY, MAX_LINE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of any display name.
pub const MAX_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name and returns it trimmed.
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters after trimming
pub fn validate_name<'a>(field: &str, name: &'a str) -> ValidationResult<&'a str> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name)
}

/// Same as [`validate_name`] for a field that may be missing.
pub fn validate_required_name<'a>(field: &str, name: Option<&'a str>) -> ValidationResult<&'a str> {
    validate_name(field, name.unwrap_or_default())
}

/// Trims an optional text field; blank becomes `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates that a USD amount is not negative.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a stock level (absolute value, not a delta).
pub fn validate_stock(field: &str, stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates the number of lines in a sale or purchase order.
pub fn validate_line_count(field: &str, count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Empty {
            field: field.to_string(),
        });
    }

    if count > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Enum Validators
// =============================================================================

/// Parses a payment method, listing the allowed names on failure.
pub fn validate_payment_method(value: Option<&str>) -> ValidationResult<PaymentMethod> {
    let value = value.map(str::trim).filter(|s| !s.is_empty());
    let Some(value) = value else {
        return Err(ValidationError::required("payment_method"));
    };

    PaymentMethod::parse(value).ok_or_else(|| ValidationError::NotAllowed {
        field: "payment_method".to_string(),
        allowed: PaymentMethod::ALL
            .iter()
            .map(|m| m.as_str().to_string())
            .collect(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", "Bebidas").unwrap(), "Bebidas");
        assert!(matches!(
            validate_name("name", "   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_name("name", &"x".repeat(201)),
            Err(ValidationError::TooLong { max: 200, .. })
        ));
        assert!(validate_name("name", &"ñ".repeat(200)).is_ok());
        assert!(validate_required_name("name", None).is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  @tienda ")), Some("@tienda".to_string()));
        assert_eq!(normalize_optional(Some("")), None);
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("quantity", 1).is_ok());
        assert!(validate_quantity("quantity", 9_999).is_ok());
        assert!(validate_quantity("quantity", 0).is_err());
        assert!(validate_quantity("quantity", -3).is_err());
        assert!(validate_quantity("quantity", 10_000).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_non_negative("cost", Money::zero()).is_ok());
        assert!(validate_non_negative("cost", Money::from_cents(-1)).is_err());
        assert!(validate_stock("stock", 0).is_ok());
        assert!(validate_stock("stock", -1).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(matches!(
            validate_line_count("items", 0),
            Err(ValidationError::Empty { .. })
        ));
        assert!(validate_line_count("items", 1).is_ok());
        assert!(validate_line_count("items", 101).is_err());
    }

    #[test]
    fn test_validate_payment_method() {
        assert_eq!(
            validate_payment_method(Some("efectivo")).unwrap(),
            PaymentMethod::Efectivo
        );
        assert!(matches!(
            validate_payment_method(None),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_payment_method(Some("cheque")),
            Err(ValidationError::NotAllowed { .. })
        ));
    }
}
