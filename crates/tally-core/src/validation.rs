//! # Validation Module
//!
//! Construction-time checks for pricing inputs.
//!
//! Every value that enters the pricing tree passes through one of these
//! functions first. Once an `Item` or `Bundle` exists, its invariants hold,
//! which is what lets aggregation and the adjustment pipeline stay total.
//!
//! ```text
//! Item::new ──────► validate_required(id, name)
//!                   validate_unit_price
//!                   validate_quantity
//!
//! Bundle::new ────► validate_required(name)
//!                   validate_discount
//!                   validate_quantity
//!
//! Bundle::add ────► validate_depth
//!                   checked_amount(bundle value)
//!
//! Cart::add_node ─► checked_amount(cart subtotal)
//!
//! rule ::new ─────► validate_rate / validate_non_negative
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_TREE_DEPTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates that a string field is not blank.
///
/// ```rust
/// use tally_core::validation::validate_required;
///
/// assert!(validate_required("item id", "SKU-1").is_ok());
/// assert!(validate_required("item id", "   ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity (item count or bundle multiplier).
///
/// ## Rules
/// - Must be at least 1
pub fn validate_quantity(field: &str, qty: u32) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::InvalidQuantity {
            field: field.to_string(),
            value: qty,
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ```rust
/// use rust_decimal_macros::dec;
/// use tally_core::validation::validate_unit_price;
///
/// assert!(validate_unit_price(dec!(10.99)).is_ok());
/// assert!(validate_unit_price(dec!(0)).is_ok());
/// assert!(validate_unit_price(dec!(-1)).is_err());
/// ```
pub fn validate_unit_price(price: Decimal) -> ValidationResult<()> {
    if price < Decimal::ZERO {
        return Err(ValidationError::InvalidPrice { value: price });
    }

    Ok(())
}

/// Validates a bundle discount fraction.
///
/// ## Rules
/// - Must be in the half-open range [0, 1)
/// - 1.0 would make the bundle free regardless of content; rejected
pub fn validate_discount(discount: Decimal) -> ValidationResult<()> {
    if discount < Decimal::ZERO || discount >= Decimal::ONE {
        return Err(ValidationError::InvalidDiscount { value: discount });
    }

    Ok(())
}

/// Validates a rule's percentage, given as a fraction in [0, 1).
pub fn validate_rate(field: &str, rate: Decimal) -> ValidationResult<()> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: rate,
        });
    }

    Ok(())
}

/// Validates a value that may be anything from zero up (tax rate, cap).
pub fn validate_non_negative(field: &str, value: Decimal) -> ValidationResult<()> {
    if value < Decimal::ZERO {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
        });
    }

    Ok(())
}

/// Unwraps the result of a checked `Money` operation.
///
/// ```rust
/// use rust_decimal::Decimal;
/// use tally_core::money::Money;
/// use tally_core::validation::checked_amount;
///
/// let huge = Money::new(Decimal::MAX);
/// assert!(checked_amount("line total", huge.checked_multiply_quantity(2)).is_err());
/// ```
pub fn checked_amount(field: &str, amount: Option<Money>) -> ValidationResult<Money> {
    amount.ok_or_else(|| ValidationError::AmountOverflow {
        field: field.to_string(),
    })
}

// =============================================================================
// Structural Validators
// =============================================================================

/// Validates the depth of a tree after a child is attached.
///
/// A lone leaf has depth 1; a bundle is one deeper than its deepest child.
pub fn validate_depth(depth: usize) -> ValidationResult<()> {
    if depth > MAX_TREE_DEPTH {
        return Err(ValidationError::TooDeep {
            max: MAX_TREE_DEPTH,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
