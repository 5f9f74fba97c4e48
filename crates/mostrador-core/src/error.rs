//! # Error Types
//!
//! Domain-specific error types for mostrador-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mostrador-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations, missing entities     │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ProrationError   - Purchase orders that cannot be prorated        │
//! │                                                                         │
//! │  mostrador-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - What HTTP clients see ({ "error": ... })       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → JSON body              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing and proration math never produce these for malformed numbers;
//! bad numeric input is coerced to zero by [`crate::lenient`]. Errors are
//! reserved for rule violations the caller must see.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id doesn't exist for this tenant.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Customer id doesn't exist for this tenant.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Category id doesn't exist for this tenant.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Sale id doesn't exist for this tenant.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Insufficient stock to complete a sale line.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line: "Yerba 1kg" × 5
    ///      │
    ///      ▼
    /// Check stock: available = 3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Yerba 1kg", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Toast: "Insufficient stock for Yerba 1kg: available 3, requested 5"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Purchase order could not be prorated.
    #[error(transparent)]
    Proration(#[from] ProrationError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write happens; the message always names the field.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Field is present but not a number.
    #[error("{field} must be a number")]
    NotANumber { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Collection must contain at least one element.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// Duplicate value (e.g., duplicate category name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required { field: field.into() }
    }

    pub fn not_a_number(field: impl Into<String>) -> Self {
        ValidationError::NotANumber { field: field.into() }
    }
}

// =============================================================================
// Proration Error
// =============================================================================

/// Reasons a purchase order's shipping cost cannot be distributed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProrationError {
    /// No lines were submitted.
    #[error("Order has no items")]
    EmptyOrder,

    /// Σ quantity × cost is zero, so there is nothing to prorate against.
    #[error("Total product cost is zero; shipping cannot be prorated")]
    ZeroProductCost,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Yerba 1kg".to_string(),
            available: 1,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Yerba 1kg: available 1, requested 2"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("name").to_string(), "name is required");
        assert_eq!(
            ValidationError::not_a_number("profit_margin").to_string(),
            "profit_margin must be a number"
        );
        let err = ValidationError::NotAllowed {
            field: "payment_method".to_string(),
            allowed: vec!["efectivo".to_string(), "transferencia".to_string()],
        };
        assert_eq!(
            err.to_string(),
            r#"payment_method must be one of: ["efectivo", "transferencia"]"#
        );
    }

    #[test]
    fn test_wrapped_errors_convert() {
        let core_err: CoreError = ValidationError::required("items").into();
        assert!(matches!(core_err, CoreError::Validation(_)));

        let core_err: CoreError = ProrationError::ZeroProductCost.into();
        assert_eq!(
            core_err.to_string(),
            "Total product cost is zero; shipping cannot be prorated"
        );
    }
}
