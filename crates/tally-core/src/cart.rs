//! # Cart
//!
//! Owns the pricing tree, the adjustment pipeline and the customer, and
//! derives every figure from them on demand.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                                   │
//! │                                                                         │
//! │  Caller Action             Cart Method               State Change       │
//! │  ─────────────             ───────────               ────────────       │
//! │                                                                         │
//! │  Add item / bundle ──────► add_node() ─────────────► nodes.push()       │
//! │  Remove it again ────────► remove_node(id) ────────► nodes.remove()     │
//! │  Register a rule ────────► add_rule() ─────────────► rules.push()       │
//! │  Drop all rules ─────────► clear_rules() ──────────► rules.clear()      │
//! │                                                                         │
//! │  Show subtotal ──────────► subtotal() ─────────────► (read only)        │
//! │  Show total ─────────────► calculate_total() ──────► (read only)        │
//! │  Award points ───────────► award_bonus_points() ───► customer balance   │
//! │                                                                         │
//! │  Nothing is cached: every read walks the tree again, so a mutation     │
//! │  is always reflected by the next read.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! A `Cart` is a plain owned value. Callers that share one across threads
//! wrap the whole cart in a lock; a walk must not overlap a mutation.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::money::Money;
use crate::rules::{AdjustmentRule, PriceContext};
use crate::tree::{Node, NodeId};
use crate::types::{Customer, Item};
use crate::validation::{checked_amount, ValidationResult};
use crate::BIRTHDAY_BONUS_MULTIPLIER;

// =============================================================================
// Cart
// =============================================================================

/// A shopping cart for one customer session.
#[derive(Debug)]
pub struct Cart {
    customer: Customer,
    nodes: Vec<Node>,
    rules: Vec<Box<dyn AdjustmentRule>>,
    pricing_date: NaiveDate,
    birthday_bonus_multiplier: u32,
}

impl Cart {
    /// Creates an empty cart priced as of today (local time).
    pub fn new(customer: Customer) -> Self {
        Cart {
            customer,
            nodes: Vec::new(),
            rules: Vec::new(),
            pricing_date: Local::now().date_naive(),
            birthday_bonus_multiplier: BIRTHDAY_BONUS_MULTIPLIER,
        }
    }

    /// Prices the cart as of `date` instead of today.
    #[must_use]
    pub fn with_pricing_date(mut self, date: NaiveDate) -> Self {
        self.pricing_date = date;
        self
    }

    #[must_use]
    pub fn with_birthday_bonus_multiplier(mut self, multiplier: u32) -> Self {
        self.birthday_bonus_multiplier = multiplier;
        self
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn pricing_date(&self) -> NaiveDate {
        self.pricing_date
    }

    pub fn set_pricing_date(&mut self, date: NaiveDate) {
        self.pricing_date = date;
    }

    // =========================================================================
    // Tree
    // =========================================================================

    /// Adds a top-level item or bundle and returns its id.
    ///
    /// ## Errors
    /// `AmountOverflow` if the subtotal would no longer fit in a `Money`.
    /// The cart is unchanged on error.
    pub fn add_node(&mut self, node: impl Into<Node>) -> ValidationResult<NodeId> {
        let node = node.into();
        checked_amount(
            "cart subtotal",
            self.subtotal().checked_add(node.aggregate_value()),
        )?;

        let id = node.id();
        debug!(node_id = %id, name = node.name(), group = node.is_group(), "Adding node to cart");
        self.nodes.push(node);
        Ok(id)
    }

    /// Removes the top-level node with the given id.
    ///
    /// Returns `None` and leaves the cart untouched when no top-level node has
    /// that id. Nodes nested inside bundles are not searched.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let Some(index) = self.nodes.iter().position(|node| node.id() == id) else {
            debug!(node_id = %id, "Node not found in cart, nothing removed");
            return None;
        };
        Some(self.nodes.remove(index))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every item in the cart, depth-first across top-level nodes.
    pub fn flatten_items(&self) -> Vec<&Item> {
        let mut items = Vec::new();
        for node in &self.nodes {
            node.collect_items(&mut items);
        }
        items
    }

    /// Σ `quantity()` over top-level nodes.
    ///
    /// A bundle contributes its own multiplier, not the quantities of what it
    /// contains.
    pub fn item_count(&self) -> u64 {
        self.nodes.iter().map(|node| u64::from(node.quantity())).sum()
    }

    // =========================================================================
    // Rules
    // =========================================================================

    /// Appends a rule to the end of the pipeline.
    pub fn add_rule(&mut self, rule: impl AdjustmentRule + 'static) {
        self.add_boxed_rule(Box::new(rule));
    }

    pub fn add_boxed_rule(&mut self, rule: Box<dyn AdjustmentRule>) {
        debug!(rule = %rule.describe(), position = self.rules.len(), "Registering rule");
        self.rules.push(rule);
    }

    pub fn clear_rules(&mut self) {
        self.rules.clear();
    }

    /// Labels of the registered rules, in pipeline order.
    pub fn applied_rule_descriptions(&self) -> Vec<String> {
        self.rules.iter().map(|rule| rule.describe()).collect()
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// Σ aggregate values of the top-level nodes. Not rounded.
    pub fn subtotal(&self) -> Money {
        self.nodes.iter().map(Node::aggregate_value).sum()
    }

    /// Subtotal folded through every rule, rounded once to cents.
    ///
    /// ```rust
    /// use rust_decimal_macros::dec;
    /// use tally_core::{Cart, Customer, Item, Money, NewCustomerDiscount, Vat};
    ///
    /// let mut cart = Cart::new(Customer::new("c-1", "a@example.com").new_customer(true));
    /// cart.add_node(Item::new("A", "Alpha", dec!(100), 1).unwrap()).unwrap();
    /// cart.add_rule(NewCustomerDiscount::default());
    /// cart.add_rule(Vat::default());
    ///
    /// // 100 × 0.95 × 1.077 = 102.315 → 102.32
    /// assert_eq!(cart.calculate_total(), Money::new(dec!(102.32)));
    /// ```
    pub fn calculate_total(&self) -> Money {
        self.run_pipeline(|_, _| {}).round_to_cents()
    }

    /// Subtotal, every pipeline step, total and bonus points in one pass.
    pub fn summary(&self) -> CartSummary {
        let mut steps = Vec::with_capacity(self.rules.len());
        let total = self
            .run_pipeline(|rule, amount| {
                steps.push(RuleStep {
                    description: rule.describe(),
                    amount,
                })
            })
            .round_to_cents();

        CartSummary {
            subtotal: self.subtotal(),
            steps,
            total,
            item_count: self.item_count(),
            bonus_points: self.calculate_bonus_points(),
        }
    }

    /// Folds the subtotal through the rules, reporting the amount after each.
    fn run_pipeline(&self, mut on_step: impl FnMut(&dyn AdjustmentRule, Money)) -> Money {
        let items = self.flatten_items();
        let mut amount = self.subtotal();

        for rule in &self.rules {
            let ctx = PriceContext {
                customer: &self.customer,
                items: &items,
                amount,
                pricing_date: self.pricing_date,
            };
            let next = rule.apply(amount, &ctx);
            debug!(rule = %rule.describe(), before = %amount, after = %next, "Applied rule");
            on_step(rule.as_ref(), next);
            amount = next;
        }

        amount
    }

    // =========================================================================
    // Bonus Points
    // =========================================================================

    /// Points earned by this cart.
    ///
    /// ## Formula
    /// ```text
    /// Σ floor(unit_price × quantity)   over bonus-eligible items
    ///   × birthday multiplier          if today is the customer's birthday
    /// ```
    ///
    /// Uses raw item values; discounts and VAT do not affect points.
    /// Saturates at `u64::MAX`.
    pub fn calculate_bonus_points(&self) -> u64 {
        let points = self
            .flatten_items()
            .into_iter()
            .filter(|item| item.is_bonus_eligible())
            .map(|item| item.line_total().whole_units())
            .fold(0u64, u64::saturating_add);

        if self.customer.has_birthday_on(self.pricing_date) {
            points.saturating_mul(u64::from(self.birthday_bonus_multiplier))
        } else {
            points
        }
    }

    /// Credits [`Cart::calculate_bonus_points`] to the customer and returns it.
    pub fn award_bonus_points(&mut self) -> u64 {
        let points = self.calculate_bonus_points();
        self.customer.credit_bonus_points(points);
        debug!(
            customer = %self.customer.id,
            points,
            balance = self.customer.bonus_points,
            "Awarded bonus points"
        );
        points
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Amount after one rule ran. Unrounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleStep {
    pub description: String,
    pub amount: Money,
}

/// Everything a receipt or report needs, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSummary {
    pub subtotal: Money,
    pub steps: Vec<RuleStep>,
    pub total: Money,
    pub item_count: u64,
    pub bonus_points: u64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::rules::{BirthdayDiscount, NewCustomerDiscount, Vat, VolumeDiscount};
    use crate::tree::Bundle;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn item(id: &str, price: Decimal, qty: u32) -> Item {
        Item::new(id, format!("Product {}", id), price, qty).unwrap()
    }

    fn cart_for(customer: Customer) -> Cart {
        Cart::new(customer).with_pricing_date(today())
    }

    fn returning() -> Customer {
        Customer::new("c-1", "c@example.com")
    }

    // -------------------------------------------------------------------------
    // Reference scenarios
    // -------------------------------------------------------------------------

    #[test]
    fn test_single_item_no_rules() {
        let mut cart = cart_for(returning());
        cart.add_node(item("A", dec!(100), 1)).unwrap();

        assert_eq!(cart.subtotal(), Money::new(dec!(100)));
        assert_eq!(cart.calculate_total(), Money::new(dec!(100)));
    }

    #[test]
    fn test_bundle_discount_subtotal() {
        let mut cart = cart_for(returning());
        let bundle = Bundle::new("Pair", dec!(0.1), 1)
            .unwrap()
            .with(item("A", dec!(50), 1))
            .unwrap()
            .with(item("B", dec!(30), 1))
            .unwrap();
        cart.add_node(bundle).unwrap();

        assert_eq!(cart.subtotal(), Money::new(dec!(72.0)));
    }

    #[test]
    fn test_new_customer_discount_scenarios() {
        let mut cart = cart_for(returning().new_customer(true));
        cart.add_node(item("A", dec!(100), 1)).unwrap();
        cart.add_rule(NewCustomerDiscount::default());
        assert_eq!(cart.calculate_total(), Money::new(dec!(95.0)));

        let mut cart = cart_for(returning().new_customer(true));
        cart.add_node(item("A", dec!(100), 1).on_sale(true)).unwrap();
        cart.add_rule(NewCustomerDiscount::default());
        assert_eq!(cart.calculate_total(), Money::new(dec!(100.0)));
    }

    #[test]
    fn test_vat_only() {
        let mut cart = cart_for(returning());
        cart.add_node(item("A", dec!(100), 1)).unwrap();
        cart.add_rule(Vat::default());
        assert_eq!(cart.calculate_total(), Money::new(dec!(107.7)));
    }

    #[test]
    fn test_nested_bundles() {
        let inner = Bundle::new("Inner", dec!(0.1), 1)
            .unwrap()
            .with(item("A", dec!(10), 1))
            .unwrap()
            .with(item("B", dec!(20), 1))
            .unwrap();
        let outer = Bundle::new("Outer", dec!(0.05), 1)
            .unwrap()
            .with(inner)
            .unwrap()
            .with(item("C", dec!(30), 1))
            .unwrap();

        let mut cart = cart_for(returning());
        cart.add_node(outer).unwrap();
        assert_eq!(cart.subtotal(), Money::new(dec!(54.15)));
        assert_eq!(cart.calculate_total(), Money::new(dec!(54.15)));
    }

    #[test]
    fn test_volume_discount_scenario() {
        let mut cart = cart_for(returning());
        cart.add_node(item("A", dec!(10), 15)).unwrap();
        cart.add_rule(VolumeDiscount::default());
        assert_eq!(cart.calculate_total(), Money::new(dec!(142.5)));
    }

    // -------------------------------------------------------------------------
    // Pipeline behaviour
    // -------------------------------------------------------------------------

    #[test]
    fn test_new_customer_then_vat_rounds_once() {
        let mut cart = cart_for(returning().new_customer(true));
        cart.add_node(item("A", dec!(100), 1)).unwrap();
        cart.add_rule(NewCustomerDiscount::default());
        cart.add_rule(Vat::default());
        assert_eq!(cart.calculate_total(), Money::new(dec!(102.32)));
    }

    #[test]
    fn test_rule_order_matters() {
        // Volume deduction is a fixed amount (7.50), so applying it before or
        // after VAT changes the result.
        let mut volume_first = cart_for(returning());
        volume_first.add_node(item("A", dec!(10), 15)).unwrap();
        volume_first.add_rule(VolumeDiscount::default());
        volume_first.add_rule(Vat::default());

        let mut vat_first = cart_for(returning());
        vat_first.add_node(item("A", dec!(10), 15)).unwrap();
        vat_first.add_rule(Vat::default());
        vat_first.add_rule(VolumeDiscount::default());

        // 142.5 × 1.077 = 153.4725
        assert_eq!(volume_first.calculate_total(), Money::new(dec!(153.47)));
        // 150 × 1.077 − 7.5 = 154.05
        assert_eq!(vat_first.calculate_total(), Money::new(dec!(154.05)));
    }

    #[test]
    fn test_volume_counts_items_inside_bundles() {
        let bundle = Bundle::new("Crate", dec!(0.5), 1)
            .unwrap()
            .with(item("A", dec!(10), 10))
            .unwrap();
        let mut cart = cart_for(returning());
        cart.add_node(bundle).unwrap();
        cart.add_rule(VolumeDiscount::default());

        // Subtotal 50 already halves the price; volume still takes 5% of the
        // raw 100.
        assert_eq!(cart.subtotal(), Money::new(dec!(50)));
        assert_eq!(cart.calculate_total(), Money::new(dec!(45)));
    }

    #[test]
    fn test_birthday_discount_in_cart() {
        let customer = returning().with_birthday(NaiveDate::from_ymd_opt(1991, 10, 16).unwrap());
        let mut cart = cart_for(customer);
        cart.add_node(item("A", dec!(200), 1)).unwrap();
        cart.add_rule(BirthdayDiscount::default());
        assert_eq!(cart.calculate_total(), Money::new(dec!(194)));

        cart.set_pricing_date(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        assert_eq!(cart.calculate_total(), Money::new(dec!(200)));
    }

    #[test]
    fn test_clear_rules() {
        let mut cart = cart_for(returning());
        cart.add_node(item("A", dec!(100), 1)).unwrap();
        cart.add_rule(Vat::default());
        assert_eq!(cart.applied_rule_descriptions(), vec!["VAT (7.7%)".to_string()]);

        cart.clear_rules();
        assert!(cart.applied_rule_descriptions().is_empty());
        assert_eq!(cart.calculate_total(), Money::new(dec!(100)));
    }

    #[test]
    fn test_empty_cart() {
        let mut cart = cart_for(returning().new_customer(true));
        cart.add_rule(NewCustomerDiscount::default());
        cart.add_rule(Vat::default());

        assert!(cart.is_empty());
        assert!(cart.subtotal().is_zero());
        assert!(cart.calculate_total().is_zero());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.calculate_bonus_points(), 0);
    }

    // -------------------------------------------------------------------------
    // Tree management
    // -------------------------------------------------------------------------

    #[test]
    fn test_remove_node() {
        let mut cart = cart_for(returning());
        let a = cart.add_node(item("A", dec!(10), 1)).unwrap();
        cart.add_node(item("B", dec!(5), 1)).unwrap();
        assert_eq!(cart.subtotal(), Money::new(dec!(15)));

        assert!(cart.remove_node(a).is_some());
        assert_eq!(cart.subtotal(), Money::new(dec!(5)));

        // Second removal is a no-op
        assert!(cart.remove_node(a).is_none());
        assert_eq!(cart.nodes().len(), 1);
    }

    #[test]
    fn test_subtotal_idempotent_and_fresh_after_mutation() {
        let mut cart = cart_for(returning());
        cart.add_node(item("A", dec!(3.33), 3)).unwrap();
        let first = cart.subtotal();
        assert_eq!(first, cart.subtotal());

        cart.add_node(item("B", dec!(1), 1)).unwrap();
        assert_eq!(cart.subtotal(), first + Money::new(dec!(1)));
    }

    #[test]
    fn test_item_count_uses_bundle_multiplier() {
        let mut cart = cart_for(returning());
        cart.add_node(item("A", dec!(1), 4)).unwrap();
        let six_pack = Bundle::new("Six pack", dec!(0), 2)
            .unwrap()
            .with(item("B", dec!(1), 6))
            .unwrap();
        cart.add_node(six_pack).unwrap();
        // 4 + 2 (bundle multiplier), not 4 + 6
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_flatten_items_across_nodes() {
        let mut cart = cart_for(returning());
        cart.add_node(item("A", dec!(1), 1)).unwrap();
        let pair = Bundle::new("B+C", dec!(0), 1)
            .unwrap()
            .with(item("B", dec!(1), 1))
            .unwrap()
            .with(item("C", dec!(1), 1))
            .unwrap();
        cart.add_node(pair).unwrap();
        let ids: Vec<&str> = cart.flatten_items().iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_add_node_rejects_unrepresentable_subtotal() {
        let mut cart = cart_for(returning());
        cart.add_node(item("A", Decimal::MAX, 1)).unwrap();

        assert_eq!(
            cart.add_node(item("B", dec!(1), 1)),
            Err(ValidationError::AmountOverflow {
                field: "cart subtotal".to_string()
            })
        );
        assert_eq!(cart.nodes().len(), 1);
        assert_eq!(cart.subtotal(), Money::new(Decimal::MAX));
    }

    #[test]
    fn test_pricing_extreme_cart_does_not_panic() {
        // Largest accepted values everywhere: pricing saturates, never panics.
        let mut cart = cart_for(returning());
        cart.add_node(item("A", Decimal::MAX, 1).bonus_eligible(true)).unwrap();
        cart.add_rule(Vat::default());
        cart.add_rule(VolumeDiscount::default());
        cart.add_rule(Vat::default());

        assert_eq!(cart.calculate_total(), Money::new(Decimal::MAX).round_to_cents());
        assert_eq!(cart.calculate_bonus_points(), u64::MAX);
        assert_eq!(cart.summary().steps.len(), 3);
    }

    #[test]
    fn test_huge_quantities_price_without_panic() {
        let case = Bundle::new("case", dec!(0), u32::MAX)
            .unwrap()
            .with(item("A", dec!(1000), u32::MAX))
            .unwrap();
        let mut cart = cart_for(returning());
        cart.add_node(case).unwrap();
        cart.add_node(item("A", dec!(1000), u32::MAX)).unwrap();
        cart.add_rule(VolumeDiscount::default());
        cart.add_rule(Vat::default());

        // 1000 × (2³² − 1) × ((2³² − 1) + 1), less 20% volume on the raw units,
        // plus VAT: all well inside the Decimal range.
        let raw = dec!(1000) * Decimal::from(u32::MAX);
        let subtotal = raw * Decimal::from(u32::MAX) + raw;
        assert_eq!(cart.subtotal(), Money::new(subtotal));

        let volume = raw * dec!(2) * dec!(0.20);
        let expected = Money::new((subtotal - volume) * dec!(1.077)).round_to_cents();
        assert_eq!(cart.calculate_total(), expected);
    }

    // -------------------------------------------------------------------------
    // Bonus points
    // -------------------------------------------------------------------------

    #[test]
    fn test_bonus_points() {
        let mut cart = cart_for(returning());
        cart.add_node(item("A", dec!(19.99), 1).bonus_eligible(true)).unwrap();
        cart.add_node(item("B", dec!(2.50), 3).bonus_eligible(true)).unwrap();
        cart.add_node(item("C", dec!(100), 1)).unwrap();
        // floor(19.99) + floor(7.50)
        assert_eq!(cart.calculate_bonus_points(), 26);
    }

    #[test]
    fn test_bonus_points_ignore_bundle_discount_and_rules() {
        let mut cart = cart_for(returning());
        let deal = Bundle::new("Deal", dec!(0.5), 1)
            .unwrap()
            .with(item("A", dec!(40), 1).bonus_eligible(true))
            .unwrap();
        cart.add_node(deal).unwrap();
        cart.add_rule(Vat::default());
        assert_eq!(cart.calculate_bonus_points(), 40);
    }

    #[test]
    fn test_birthday_bonus_multiplier() {
        let customer = returning().with_birthday(NaiveDate::from_ymd_opt(2000, 10, 16).unwrap());
        let mut cart = cart_for(customer);
        cart.add_node(item("A", dec!(12.75), 1).bonus_eligible(true)).unwrap();
        assert_eq!(cart.calculate_bonus_points(), 120);

        let cart = cart.with_birthday_bonus_multiplier(3);
        assert_eq!(cart.calculate_bonus_points(), 36);
    }

    #[test]
    fn test_award_bonus_points_credits_customer() {
        let mut customer = returning();
        customer.bonus_points = 5;
        let mut cart = cart_for(customer);
        cart.add_node(item("A", dec!(10), 2).bonus_eligible(true)).unwrap();

        assert_eq!(cart.award_bonus_points(), 20);
        assert_eq!(cart.customer().bonus_points, 25);
        // Pricing never touches the balance
        let _ = cart.calculate_total();
        assert_eq!(cart.customer().bonus_points, 25);
    }

    // -------------------------------------------------------------------------
    // Summary
    // -------------------------------------------------------------------------

    #[test]
    fn test_summary_matches_individual_calls() {
        let mut cart = cart_for(returning().new_customer(true));
        cart.add_node(item("A", dec!(100), 1).bonus_eligible(true)).unwrap();
        cart.add_rule(NewCustomerDiscount::default());
        cart.add_rule(Vat::default());

        let summary = cart.summary();
        assert_eq!(summary.subtotal, cart.subtotal());
        assert_eq!(summary.total, cart.calculate_total());
        assert_eq!(summary.item_count, 1);
        assert_eq!(summary.bonus_points, 100);
        assert_eq!(summary.steps.len(), 2);
        assert_eq!(summary.steps[0].amount, Money::new(dec!(95)));
        assert_eq!(summary.steps[1].amount, Money::new(dec!(102.315)));
    }

    #[test]
    fn test_summary_serializes() {
        let mut cart = cart_for(returning());
        cart.add_node(item("A", dec!(100), 1)).unwrap();
        cart.add_rule(Vat::default());

        let json = serde_json::to_value(cart.summary()).unwrap();
        let total: Decimal = json["total"].as_str().unwrap().parse().unwrap();
        assert_eq!(total, dec!(107.7));
        assert_eq!(json["steps"][0]["description"], "VAT (7.7%)");
    }
}
