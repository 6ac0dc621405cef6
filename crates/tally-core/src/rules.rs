//! # Adjustment Rules
//!
//! The pipeline stages applied to a cart's subtotal.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Adjustment Pipeline                               │
//! │                                                                         │
//! │  subtotal ──► rule[0].apply ──► rule[1].apply ──► ... ──► round(2dp)   │
//! │                    ▲                 ▲                                  │
//! │                    └────── PriceContext ──────┘                         │
//! │                    customer, flattened items,                           │
//! │                    running amount, pricing date                         │
//! │                                                                         │
//! │  Rules are pure: same inputs, same output. Order is the caller's       │
//! │  choice and it matters (a percentage after VAT ≠ before VAT).          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Built-in Rules
//! | Rule                  | Effect                                          |
//! |-----------------------|-------------------------------------------------|
//! | `NewCustomerDiscount` | −min(5%, 100) for new customers, no sale items  |
//! | `BirthdayDiscount`    | −3% on the birthday, not new, no sale items     |
//! | `VolumeDiscount`      | −tiered % of raw unit price per product id      |
//! | `Vat`                 | +7.7%, unconditional                            |
//!
//! New rules implement [`AdjustmentRule`].

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Customer, Item};
use crate::validation::{
    validate_non_negative, validate_quantity, validate_rate, ValidationResult,
};

// =============================================================================
// Price Context
// =============================================================================

/// Read-only snapshot handed to each rule.
///
/// Built fresh for every step of the pipeline; never stored.
#[derive(Debug, Clone, Copy)]
pub struct PriceContext<'a> {
    pub customer: &'a Customer,
    /// Every item in the cart, depth-first, ignoring bundle structure.
    pub items: &'a [&'a Item],
    /// Running amount entering this step.
    pub amount: Money,
    /// The date birthday checks compare against.
    pub pricing_date: NaiveDate,
}

impl PriceContext<'_> {
    /// Any sale item anywhere in the cart.
    pub fn has_sale_items(&self) -> bool {
        self.items.iter().any(|item| item.is_sale_item())
    }

    pub fn is_customer_birthday(&self) -> bool {
        self.customer.has_birthday_on(self.pricing_date)
    }
}

// =============================================================================
// Adjustment Rule Trait
// =============================================================================

/// A step of the adjustment pipeline.
///
/// Implementations must be pure functions of `amount` and `ctx`.
pub trait AdjustmentRule: fmt::Debug + Send + Sync {
    /// Transforms the running amount.
    fn apply(&self, amount: Money, ctx: &PriceContext<'_>) -> Money;

    /// Human-readable label for reports. Has no effect on pricing.
    fn describe(&self) -> String;
}

/// Renders a fraction as a percentage without trailing zeros (0.077 → "7.7%").
fn percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

// =============================================================================
// New Customer Discount
// =============================================================================

/// First-purchase discount, capped.
///
/// ## Gate
/// ```text
/// customer new? ──no──► unchanged
///      │yes
/// any sale item in cart? ──yes──► unchanged   (whole cart, not per item)
///      │no
/// amount − min(amount × rate, cap)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomerDiscount {
    rate: Decimal,
    cap: Money,
}

impl NewCustomerDiscount {
    pub const DEFAULT_RATE: Decimal = dec!(0.05);
    pub const DEFAULT_CAP: Decimal = dec!(100);

    /// ## Errors
    /// `OutOfRange` unless `rate` is in [0, 1) and `cap` is not negative.
    pub fn new(rate: Decimal, cap: Decimal) -> ValidationResult<Self> {
        validate_rate("new customer rate", rate)?;
        validate_non_negative("new customer cap", cap)?;
        Ok(NewCustomerDiscount {
            rate,
            cap: Money::new(cap),
        })
    }
}

impl Default for NewCustomerDiscount {
    fn default() -> Self {
        NewCustomerDiscount {
            rate: Self::DEFAULT_RATE,
            cap: Money::new(Self::DEFAULT_CAP),
        }
    }
}

impl AdjustmentRule for NewCustomerDiscount {
    fn apply(&self, amount: Money, ctx: &PriceContext<'_>) -> Money {
        if !ctx.customer.is_new_customer || ctx.has_sale_items() {
            return amount;
        }

        let discount = amount.portion(self.rate).min(self.cap);
        amount - discount
    }

    fn describe(&self) -> String {
        format!(
            "New customer discount ({}, max {})",
            percent(self.rate),
            self.cap
        )
    }
}

// =============================================================================
// Birthday Discount
// =============================================================================

/// Percentage off on the customer's birthday.
///
/// Does not stack with the new-customer path: first-purchase customers are
/// excluded. Any sale item in the cart also disables it.
#[derive(Debug, Clone, PartialEq)]
pub struct BirthdayDiscount {
    rate: Decimal,
}

impl BirthdayDiscount {
    pub const DEFAULT_RATE: Decimal = dec!(0.03);

    pub fn new(rate: Decimal) -> ValidationResult<Self> {
        validate_rate("birthday rate", rate)?;
        Ok(BirthdayDiscount { rate })
    }
}

impl Default for BirthdayDiscount {
    fn default() -> Self {
        BirthdayDiscount {
            rate: Self::DEFAULT_RATE,
        }
    }
}

impl AdjustmentRule for BirthdayDiscount {
    fn apply(&self, amount: Money, ctx: &PriceContext<'_>) -> Money {
        if !ctx.is_customer_birthday() || ctx.customer.is_new_customer || ctx.has_sale_items() {
            return amount;
        }

        amount.discounted_by(self.rate)
    }

    fn describe(&self) -> String {
        format!("Birthday discount ({})", percent(self.rate))
    }
}

// =============================================================================
// Volume Discount
// =============================================================================

/// One step of the volume schedule: buy at least `min_quantity`, save `rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeTier {
    pub min_quantity: u32,
    pub rate: Decimal,
}

impl VolumeTier {
    pub const fn new(min_quantity: u32, rate: Decimal) -> Self {
        VolumeTier { min_quantity, rate }
    }
}

/// Tiered discount on the quantity bought per product id.
///
/// ## Algorithm
/// ```text
/// flattened items ──► group by id, Σ quantity
///                     unit price = first item seen with that id
///                         │
///                         ▼
///        highest tier with min_quantity <= Σ quantity
///                         │
///                         ▼
///        deduction = unit price × Σ quantity × tier rate
///
/// amount − Σ deductions
/// ```
///
/// ## Known Interaction
/// The deduction uses raw unit prices. Items inside a discounted bundle are
/// already cheaper in the running amount, and this rule subtracts its own
/// discount on top without accounting for that. The result can go below what
/// either discount alone would give, and in extreme cases below zero.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDiscount {
    tiers: Vec<VolumeTier>,
}

impl VolumeDiscount {
    pub const DEFAULT_TIERS: [VolumeTier; 3] = [
        VolumeTier::new(10, dec!(0.05)),
        VolumeTier::new(20, dec!(0.10)),
        VolumeTier::new(50, dec!(0.20)),
    ];

    /// Tiers may be given in any order; they are sorted by threshold.
    ///
    /// ## Errors
    /// - `InvalidQuantity` for a tier with a zero threshold
    /// - `OutOfRange` for a tier rate outside [0, 1)
    pub fn new(mut tiers: Vec<VolumeTier>) -> ValidationResult<Self> {
        for tier in &tiers {
            validate_quantity("volume tier min_quantity", tier.min_quantity)?;
            validate_rate("volume tier rate", tier.rate)?;
        }
        tiers.sort_by_key(|tier| tier.min_quantity);
        Ok(VolumeDiscount { tiers })
    }

    pub fn tiers(&self) -> &[VolumeTier] {
        &self.tiers
    }

    /// The rate for a summed quantity, or `None` below the first threshold.
    ///
    /// Thresholds are inclusive and equal thresholds resolve to the later
    /// tier.
    pub fn rate_for(&self, quantity: u64) -> Option<Decimal> {
        self.tiers
            .iter()
            .filter(|tier| u64::from(tier.min_quantity) <= quantity)
            .last()
            .map(|tier| tier.rate)
    }

    /// Total deduction for a set of items.
    pub fn discount_for(&self, items: &[&Item]) -> Money {
        let mut by_id: HashMap<&str, (Money, u64)> = HashMap::new();
        for item in items {
            let entry = by_id.entry(item.id()).or_insert((item.unit_price(), 0));
            entry.1 += u64::from(item.quantity());
        }

        by_id
            .values()
            .filter_map(|&(unit_price, quantity)| {
                self.rate_for(quantity).map(|rate| {
                    Money::new(unit_price.amount().saturating_mul(Decimal::from(quantity)))
                        .portion(rate)
                })
            })
            .sum()
    }
}

impl Default for VolumeDiscount {
    fn default() -> Self {
        VolumeDiscount {
            tiers: Self::DEFAULT_TIERS.to_vec(),
        }
    }
}

impl AdjustmentRule for VolumeDiscount {
    fn apply(&self, amount: Money, ctx: &PriceContext<'_>) -> Money {
        amount - self.discount_for(ctx.items)
    }

    fn describe(&self) -> String {
        let tiers: Vec<String> = self
            .tiers
            .iter()
            .map(|tier| format!("{}+: {}", tier.min_quantity, percent(tier.rate)))
            .collect();
        format!("Volume discount ({})", tiers.join(", "))
    }
}

// =============================================================================
// VAT
// =============================================================================

/// Value added tax on the running amount. Always applies.
#[derive(Debug, Clone, PartialEq)]
pub struct Vat {
    rate: Decimal,
}

impl Vat {
    pub const DEFAULT_RATE: Decimal = dec!(0.077);

    /// Any rate from zero up is accepted.
    pub fn new(rate: Decimal) -> ValidationResult<Self> {
        validate_non_negative("VAT rate", rate)?;
        Ok(Vat { rate })
    }
}

impl Default for Vat {
    fn default() -> Self {
        Vat {
            rate: Self::DEFAULT_RATE,
        }
    }
}

impl AdjustmentRule for Vat {
    fn apply(&self, amount: Money, _ctx: &PriceContext<'_>) -> Money {
        amount.marked_up_by(self.rate)
    }

    fn describe(&self) -> String {
        format!("VAT ({})", percent(self.rate))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
