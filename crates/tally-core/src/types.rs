//! # Domain Types
//!
//! The value objects a cart is built from.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐         ┌─────────────────────┐               │
//! │  │       Item          │         │      Customer       │               │
//! │  │  ─────────────────  │         │  ─────────────────  │               │
//! │  │  id (product key)   │         │  id, email          │               │
//! │  │  name               │         │  is_new_customer    │               │
//! │  │  unit_price (Money) │         │  birthday (opt)     │               │
//! │  │  quantity (>= 1)    │         │  bonus_points       │               │
//! │  │  is_sale_item       │         └─────────────────────┘               │
//! │  │  is_bonus_eligible  │                                                │
//! │  └─────────────────────┘                                                │
//! │                                                                         │
//! │  Item is immutable after construction (private fields + getters).      │
//! │  Customer is a plain record; pricing only ever reads it.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::money::Money;
use crate::validation::{
    checked_amount, validate_quantity, validate_required, validate_unit_price, ValidationResult,
};

// =============================================================================
// Item
// =============================================================================

/// A purchasable product line.
///
/// ## Identity
/// `id` is the product key. The same product may be added to a cart more than
/// once (e.g. once loose and once inside a bundle); volume pricing sums the
/// quantities of every item that shares an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: String,
    name: String,
    unit_price: Money,
    quantity: u32,
    is_sale_item: bool,
    is_bonus_eligible: bool,
}

impl Item {
    /// Creates a regular (not on sale, not bonus eligible) item.
    ///
    /// ## Errors
    /// - `Required` if `id` or `name` is blank
    /// - `InvalidPrice` if `unit_price` is negative
    /// - `InvalidQuantity` if `quantity` is 0
    /// - `AmountOverflow` if `unit_price × quantity` does not fit in a `Money`
    ///
    /// ```rust
    /// use rust_decimal_macros::dec;
    /// use tally_core::Item;
    ///
    /// let item = Item::new("COFFEE-1KG", "Coffee 1kg", dec!(24.50), 2).unwrap();
    /// assert_eq!(item.line_total().to_string(), "49.00");
    ///
    /// assert!(Item::new("X", "Broken", dec!(-1), 1).is_err());
    /// ```
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> ValidationResult<Self> {
        let id = id.into();
        let name = name.into();

        validate_required("item id", &id)?;
        validate_required("item name", &name)?;
        validate_unit_price(unit_price)?;
        validate_quantity("item quantity", quantity)?;

        let unit_price = Money::new(unit_price);
        checked_amount(
            "item line total",
            unit_price.checked_multiply_quantity(quantity),
        )?;

        Ok(Item {
            id,
            name,
            unit_price,
            quantity,
            is_sale_item: false,
            is_bonus_eligible: false,
        })
    }

    /// Marks the item as a sale item.
    #[must_use]
    pub fn on_sale(mut self, on_sale: bool) -> Self {
        self.is_sale_item = on_sale;
        self
    }

    /// Marks the item as earning bonus points.
    #[must_use]
    pub fn bonus_eligible(mut self, eligible: bool) -> Self {
        self.is_bonus_eligible = eligible;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn is_sale_item(&self) -> bool {
        self.is_sale_item
    }

    pub fn is_bonus_eligible(&self) -> bool {
        self.is_bonus_eligible
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// The shopper a cart is priced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: String,

    pub email: String,

    /// First purchase. Qualifies for the new-customer discount and excludes
    /// the birthday discount.
    pub is_new_customer: bool,

    /// Only month and day matter; the year is ignored.
    pub birthday: Option<NaiveDate>,

    /// Accumulated bonus point balance.
    pub bonus_points: u64,
}

impl Customer {
    /// Creates a returning customer with no birthday on file.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Customer {
            id: id.into(),
            email: email.into(),
            is_new_customer: false,
            birthday: None,
            bonus_points: 0,
        }
    }

    #[must_use]
    pub fn new_customer(mut self, is_new: bool) -> Self {
        self.is_new_customer = is_new;
        self
    }

    #[must_use]
    pub fn with_birthday(mut self, birthday: NaiveDate) -> Self {
        self.birthday = Some(birthday);
        self
    }

    /// Checks whether `date` falls on the customer's birthday.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use tally_core::Customer;
    ///
    /// let born = NaiveDate::from_ymd_opt(1990, 3, 14).unwrap();
    /// let customer = Customer::new("c-1", "a@example.com").with_birthday(born);
    ///
    /// assert!(customer.has_birthday_on(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()));
    /// assert!(!customer.has_birthday_on(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()));
    /// ```
    ///
    /// A 29 February birthday only matches on 29 February.
    pub fn has_birthday_on(&self, date: NaiveDate) -> bool {
        self.birthday
            .map(|b| b.month() == date.month() && b.day() == date.day())
            .unwrap_or(false)
    }

    /// Adds points to the balance, saturating at `u64::MAX`.
    pub fn credit_bonus_points(&mut self, points: u64) {
        self.bonus_points = self.bonus_points.saturating_add(points);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
