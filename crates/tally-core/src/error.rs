//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors (config, wrapping)       │
//! │  └── ValidationError  - Construction-time precondition failures        │
//! │                                                                         │
//! │  tally-cli errors (separate crate)                                     │
//! │  └── CliError         - File, parse and environment failures           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CliError → exit code              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Where Errors Can Happen
//! Only at the boundary: building an `Item`, a `Bundle`, a rule or a config,
//! and attaching a node to a bundle or cart. Aggregation and the adjustment
//! pipeline are total and never fail.
//!
//! Removing a node that is not present is NOT an error. `remove` returns
//! `None` and the cart is left untouched.

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core pricing errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Pricing configuration is inconsistent (bad rate, empty tier, ...).
    #[error("Invalid pricing configuration: {0}")]
    InvalidConfig(String),

    /// Unknown adjustment rule name.
    #[error("Unknown adjustment rule '{0}'. Valid options: new_customer, birthday, volume, vat")]
    UnknownRule(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
/// Raised when a line, bundle, tree or rule would violate a pricing invariant.
/// Raised when an item, bundle or tree would violate a pricing invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Item or bundle quantity below 1.
    #[error("{field} must be at least 1, got {value}")]
    InvalidQuantity { field: String, value: u32 },

    /// Negative unit price.
    #[error("unit price must not be negative, got {value}")]
    InvalidPrice { value: Decimal },

    /// Bundle discount outside [0, 1).
    #[error("discount must be in [0, 1), got {value}")]
    InvalidDiscount { value: Decimal },

    /// Bundle nesting exceeds the supported depth.
    #[error("bundle nesting exceeds maximum depth of {max}")]
    TooDeep { max: usize },

    /// Rule rate or cap outside its allowed range.
    #[error("{field} out of range, got {value}")]
    OutOfRange { field: String, value: Decimal },

    /// A line, bundle or cart value would not fit in a `Money`.
    #[error("{field} exceeds the supported amount range")]
    AmountOverflow { field: String },
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
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::InvalidDiscount { value: dec!(1.5) };
        assert_eq!(err.to_string(), "discount must be in [0, 1), got 1.5");

        let err = ValidationError::InvalidQuantity {
            field: "bundle quantity".to_string(),
            value: 0,
        };
        assert_eq!(err.to_string(), "bundle quantity must be at least 1, got 0");

        let err = ValidationError::AmountOverflow {
            field: "cart subtotal".to_string(),
        };
        assert_eq!(err.to_string(), "cart subtotal exceeds the supported amount range");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "item id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
