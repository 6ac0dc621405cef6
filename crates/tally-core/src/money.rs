//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Integer cents don't help either: rules multiply by 0.95, 0.97, 1.077  │
//! │  and the result must NOT be rounded until the very end.                │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal                                          │
//! │    100 × 0.95 × 1.077 = 102.315 exactly → rounds to 102.32             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal_macros::dec;
//! use tally_core::money::Money;
//!
//! let price = Money::new(dec!(10.99));
//! let line = price.multiply_quantity(3);     // 32.97
//! let total = line + Money::from_cents(500); // 37.97
//! assert_eq!(total.to_string(), "37.97");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the cart's single currency.
///
/// ## Design Decisions
/// - **Decimal (signed)**: exact for every rate the rules use; negative values
///   are representable so a large volume deduction is visible instead of
///   being clamped away
/// - **Unrounded by default**: only [`Money::round_to_cents`] rounds, and the
///   cart calls it exactly once at the end of the pipeline
/// - **Never panics**: the operators and scaling helpers saturate at the
///   `Decimal` range. The `checked_*` variants report overflow instead and are
///   what `Item`, `Bundle` and `Cart` use to reject oversized input
///
/// ## Where Money is Used
/// ```text
/// Item.unit_price ──► Leaf value ──► Bundle value ──► Cart.subtotal
///                                                          │
///                               rule 1 ──► rule 2 ──► ... ─┘
///                                                          │
///                                        round_to_cents ──► Cart.total
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero money value.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates a Money value from a decimal amount in major units.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).to_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Rounds to 2 decimal places, half away from zero.
    ///
    /// ## Rounding
    /// ```text
    /// 102.315  → 102.32
    /// 102.3149 → 102.31
    /// -0.005   → -0.01
    /// ```
    ///
    /// ```rust
    /// use rust_decimal_macros::dec;
    /// use tally_core::money::Money;
    ///
    /// let raw = Money::new(dec!(102.315));
    /// assert_eq!(raw.round_to_cents(), Money::new(dec!(102.32)));
    /// ```
    pub fn round_to_cents(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0.saturating_mul(Decimal::from(qty)))
    }

    /// Returns `self × rate` (e.g. the 5% share of an amount).
    #[inline]
    pub fn portion(&self, rate: Decimal) -> Money {
        Money(self.0.saturating_mul(rate))
    }

    /// Returns `self × (1 − fraction)`.
    ///
    /// ```rust
    /// use rust_decimal_macros::dec;
    /// use tally_core::money::Money;
    ///
    /// let subtotal = Money::new(dec!(80));
    /// assert_eq!(subtotal.discounted_by(dec!(0.1)), Money::new(dec!(72)));
    /// ```
    #[inline]
    pub fn discounted_by(&self, fraction: Decimal) -> Money {
        Money(self.0.saturating_mul(Decimal::ONE - fraction))
    }

    /// Returns `self × (1 + rate)`.
    #[inline]
    pub fn marked_up_by(&self, rate: Decimal) -> Money {
        Money(self.0.saturating_mul(Decimal::ONE + rate))
    }

    /// Whole major units, rounded down. Negative amounts count as zero and
    /// amounts beyond `u64` saturate.
    ///
    /// Used for bonus points: 1 point per full currency unit spent.
    pub fn whole_units(&self) -> u64 {
        let floored = self.0.floor();
        if floored <= Decimal::ZERO {
            return 0;
        }
        floored.to_u64().unwrap_or(u64::MAX)
    }

    // =========================================================================
    // Checked Arithmetic
    // =========================================================================

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// `self × qty`, or `None` on overflow.
    ///
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use rust_decimal_macros::dec;
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(
    ///     Money::new(dec!(2.5)).checked_multiply_quantity(4),
    ///     Some(Money::new(dec!(10)))
    /// );
    /// assert_eq!(Money::new(Decimal::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    /// `self × (1 − fraction)`, or `None` on overflow.
    #[inline]
    pub fn checked_discounted_by(&self, fraction: Decimal) -> Option<Money> {
        self.0.checked_mul(Decimal::ONE - fraction).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Always shows exactly two decimal places, rounding half away from zero.
///
/// For display only. Arithmetic keeps full precision.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.round_to_cents().0;
        rounded.rescale(2);
        f.pad(&rounded.to_string())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

/// Multiplication by a bundle or item quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
