//! # Pricing Tree
//!
//! Items and bundles arranged as a tree whose value is computed bottom-up.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Pricing Tree                                    │
//! │                                                                         │
//! │   Bundle "Party pack" (discount 5%, ×1)                                 │
//! │   ├── Bundle "Snacks" (discount 10%, ×1)                                │
//! │   │   ├── Leaf: Chips   10.00 × 1                                       │
//! │   │   └── Leaf: Dip     20.00 × 1          (10 + 20) × 0.9 = 27.00      │
//! │   └── Leaf: Soda        30.00 × 1                                       │
//! │                                            (27 + 30) × 0.95 = 54.15     │
//! │                                                                         │
//! │   Leaf value   = unit_price × quantity                                  │
//! │   Bundle value = Σ children × (1 − discount) × quantity                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! A child is moved into its parent. Nothing can hold a node and its ancestor
//! at the same time, so a cycle cannot be expressed.
//!
//! ## Depth
//! Nesting is capped at [`MAX_TREE_DEPTH`](crate::MAX_TREE_DEPTH). Every
//! bundle caches its own depth, so the check in [`Bundle::add`] is O(1) and
//! recursion over any tree the API can build is bounded.
//!
//! ## Value Range
//! [`Bundle::add`] also refuses a child when the bundle's value would no
//! longer fit in a [`Money`]. Every value the tree can hold is therefore
//! representable, and [`Node::aggregate_value`] cannot overflow.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::money::Money;
use crate::types::Item;
use crate::validation::{
    checked_amount, validate_depth, validate_discount, validate_quantity, validate_required,
    ValidationResult,
};

// =============================================================================
// Node Identity
// =============================================================================

/// Handle used to remove a node from its parent or from a cart.
///
/// Item ids are product keys and may repeat, so nodes carry their own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(Uuid);

impl NodeId {
    fn new() -> Self {
        NodeId(Uuid::new_v4())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Node
// =============================================================================

/// A node of the pricing tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// Exactly one item, no children.
    Leaf(Leaf),
    /// Ordered children with a shared discount and multiplier.
    Bundle(Bundle),
}

impl Node {
    /// Wraps an item in a new leaf.
    pub fn leaf(item: Item) -> Self {
        Node::Leaf(Leaf::new(item))
    }

    pub fn id(&self) -> NodeId {
        match self {
            Node::Leaf(leaf) => leaf.id,
            Node::Bundle(bundle) => bundle.id,
        }
    }

    /// Item name for leaves, bundle name for bundles.
    pub fn name(&self) -> &str {
        match self {
            Node::Leaf(leaf) => leaf.item.name(),
            Node::Bundle(bundle) => &bundle.name,
        }
    }

    /// Recursively computed value of this subtree. Never rounded.
    pub fn aggregate_value(&self) -> Money {
        match self {
            Node::Leaf(leaf) => leaf.aggregate_value(),
            Node::Bundle(bundle) => bundle.aggregate_value(),
        }
    }

    /// Item quantity for leaves; the bundle's own multiplier for bundles.
    pub fn quantity(&self) -> u32 {
        match self {
            Node::Leaf(leaf) => leaf.item.quantity(),
            Node::Bundle(bundle) => bundle.quantity,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Node::Bundle(_))
    }

    /// Every item under this node, depth-first in child order.
    ///
    /// Bundles themselves do not appear; only the items of their leaves.
    pub fn flatten_items(&self) -> Vec<&Item> {
        let mut items = Vec::new();
        self.collect_items(&mut items);
        items
    }

    /// 1 for a leaf, 1 + deepest child for a bundle.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Bundle(bundle) => bundle.depth,
        }
    }

    pub(crate) fn collect_items<'a>(&'a self, out: &mut Vec<&'a Item>) {
        match self {
            Node::Leaf(leaf) => out.push(&leaf.item),
            Node::Bundle(bundle) => {
                for child in &bundle.children {
                    child.collect_items(out);
                }
            }
        }
    }
}

impl From<Item> for Node {
    fn from(item: Item) -> Self {
        Node::leaf(item)
    }
}

impl From<Leaf> for Node {
    fn from(leaf: Leaf) -> Self {
        Node::Leaf(leaf)
    }
}

impl From<Bundle> for Node {
    fn from(bundle: Bundle) -> Self {
        Node::Bundle(bundle)
    }
}

// =============================================================================
// Leaf
// =============================================================================

/// A tree node wrapping exactly one item.
#[derive(Debug, Clone)]
pub struct Leaf {
    id: NodeId,
    item: Item,
}

impl Leaf {
    pub fn new(item: Item) -> Self {
        Leaf {
            id: NodeId::new(),
            item,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    #[inline]
    pub fn aggregate_value(&self) -> Money {
        self.item.line_total()
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// A group of nodes sold together.
///
/// ## Value
/// ```text
/// Σ children.aggregate_value()  ──► × (1 − discount)  ──► × quantity
/// ```
/// An empty bundle is worth zero.
#[derive(Debug, Clone)]
pub struct Bundle {
    id: NodeId,
    name: String,
    children: Vec<Node>,
    discount: Decimal,
    quantity: u32,
    depth: usize,
}

impl Bundle {
    /// Creates an empty bundle.
    ///
    /// ## Errors
    /// - `Required` if `name` is blank
    /// - `InvalidDiscount` if `discount` is outside [0, 1)
    /// - `InvalidQuantity` if `quantity` is 0
    ///
    /// ```rust
    /// use rust_decimal_macros::dec;
    /// use tally_core::{Bundle, Item, Money};
    ///
    /// let mut bundle = Bundle::new("Duo", dec!(0.1), 1).unwrap();
    /// bundle.add(Item::new("A", "Alpha", dec!(50), 1).unwrap()).unwrap();
    /// bundle.add(Item::new("B", "Beta", dec!(30), 1).unwrap()).unwrap();
    ///
    /// assert_eq!(bundle.aggregate_value(), Money::new(dec!(72)));
    /// ```
    pub fn new(name: impl Into<String>, discount: Decimal, quantity: u32) -> ValidationResult<Self> {
        let name = name.into();

        validate_required("bundle name", &name)?;
        validate_discount(discount)?;
        validate_quantity("bundle quantity", quantity)?;

        Ok(Bundle {
            id: NodeId::new(),
            name,
            children: Vec::new(),
            discount,
            quantity,
            depth: 1,
        })
    }

    /// Appends a child and returns its id.
    ///
    /// ## Errors
    /// - `TooDeep` if attaching the child would nest past the depth limit
    /// - `AmountOverflow` if the bundle's value would no longer fit
    ///
    /// The bundle is unchanged on error.
    pub fn add(&mut self, node: impl Into<Node>) -> ValidationResult<NodeId> {
        let node = node.into();
        let depth = node.depth() + 1;
        validate_depth(depth)?;

        let value = self
            .children_total()
            .checked_add(node.aggregate_value())
            .and_then(|sum| sum.checked_discounted_by(self.discount))
            .and_then(|value| value.checked_multiply_quantity(self.quantity));
        checked_amount("bundle value", value)?;

        let id = node.id();
        self.depth = self.depth.max(depth);
        self.children.push(node);
        Ok(id)
    }

    /// Builder form of [`Bundle::add`].
    pub fn with(mut self, node: impl Into<Node>) -> ValidationResult<Self> {
        self.add(node)?;
        Ok(self)
    }

    /// Removes the direct child with the given id.
    ///
    /// Returns `None` and leaves the bundle untouched when no direct child has
    /// that id. Grandchildren are not searched.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let Some(index) = self.children.iter().position(|child| child.id() == id) else {
            debug!(bundle = %self.name, node_id = %id, "Node not found in bundle, nothing removed");
            return None;
        };

        let removed = self.children.remove(index);
        self.depth = 1 + self.children.iter().map(Node::depth).max().unwrap_or(0);
        Some(removed)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn aggregate_value(&self) -> Money {
        self.children_total()
            .discounted_by(self.discount)
            .multiply_quantity(self.quantity)
    }

    fn children_total(&self) -> Money {
        self.children.iter().map(Node::aggregate_value).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::MAX_TREE_DEPTH;
    use rust_decimal_macros::dec;

    fn item(id: &str, price: Decimal, qty: u32) -> Item {
        Item::new(id, format!("Product {}", id), price, qty).unwrap()
    }

    #[test]
    fn test_leaf_value() {
        let leaf = Node::leaf(item("A", dec!(12.5), 4));
        assert_eq!(leaf.aggregate_value(), Money::new(dec!(50)));
        assert_eq!(leaf.quantity(), 4);
        assert!(!leaf.is_group());
        assert_eq!(leaf.name(), "Product A");
    }

    #[test]
    fn test_plain_bundle_is_sum_of_children() {
        let bundle = Bundle::new("Plain", dec!(0), 1)
            .unwrap()
            .with(item("A", dec!(10), 2))
            .unwrap()
            .with(item("B", dec!(5.25), 1))
            .unwrap();
        assert_eq!(bundle.aggregate_value(), Money::new(dec!(25.25)));
    }

    #[test]
    fn test_bundle_discount_and_multiplier() {
        let bundle = Bundle::new("Twin pack", dec!(0.2), 3)
            .unwrap()
            .with(item("A", dec!(10), 1))
            .unwrap();
        // 10 × 0.8 × 3
        assert_eq!(bundle.aggregate_value(), Money::new(dec!(24)));

        let node = Node::from(bundle);
        assert!(node.is_group());
        assert_eq!(node.quantity(), 3);
    }

    #[test]
    fn test_empty_bundle_is_zero() {
        let bundle = Bundle::new("Empty", dec!(0.5), 7).unwrap();
        assert!(bundle.is_empty());
        assert!(bundle.aggregate_value().is_zero());
    }

    #[test]
    fn test_nested_bundles_compound_discounts() {
        let inner = Bundle::new("Snacks", dec!(0.1), 1)
            .unwrap()
            .with(item("CHIPS", dec!(10), 1))
            .unwrap()
            .with(item("DIP", dec!(20), 1))
            .unwrap();
        assert_eq!(inner.aggregate_value(), Money::new(dec!(27)));

        let outer = Bundle::new("Party pack", dec!(0.05), 1)
            .unwrap()
            .with(inner)
            .unwrap()
            .with(item("SODA", dec!(30), 1))
            .unwrap();
        assert_eq!(outer.aggregate_value(), Money::new(dec!(54.15)));
    }

    #[test]
    fn test_aggregate_value_is_idempotent() {
        let node: Node = Bundle::new("B", dec!(0.15), 2)
            .unwrap()
            .with(item("A", dec!(3.33), 3))
            .unwrap()
            .into();
        let first = node.aggregate_value();
        assert_eq!(first, node.aggregate_value());
        assert_eq!(first, node.aggregate_value());
    }

    #[test]
    fn test_flatten_items_depth_first() {
        let inner = Bundle::new("Inner", dec!(0), 1)
            .unwrap()
            .with(item("B", dec!(1), 1))
            .unwrap()
            .with(item("C", dec!(1), 1))
            .unwrap();
        let outer: Node = Bundle::new("Outer", dec!(0), 1)
            .unwrap()
            .with(item("A", dec!(1), 1))
            .unwrap()
            .with(inner)
            .unwrap()
            .with(item("D", dec!(1), 1))
            .unwrap()
            .into();

        let ids: Vec<&str> = outer.flatten_items().iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_flatten_leaf_yields_its_item() {
        let leaf = Node::leaf(item("ONLY", dec!(1), 1));
        let items = leaf.flatten_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), "ONLY");
    }

    #[test]
    fn test_remove_child() {
        let mut bundle = Bundle::new("B", dec!(0), 1).unwrap();
        let a = bundle.add(item("A", dec!(10), 1)).unwrap();
        bundle.add(item("B", dec!(5), 1)).unwrap();

        let removed = bundle.remove(a).unwrap();
        assert_eq!(removed.name(), "Product A");
        assert_eq!(bundle.children().len(), 1);
        assert_eq!(bundle.aggregate_value(), Money::new(dec!(5)));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut bundle = Bundle::new("B", dec!(0), 1).unwrap();
        bundle.add(item("A", dec!(10), 1)).unwrap();
        let stranger = Node::leaf(item("Z", dec!(1), 1)).id();

        assert!(bundle.remove(stranger).is_none());
        assert_eq!(bundle.children().len(), 1);
    }

    #[test]
    fn test_remove_does_not_search_grandchildren() {
        let mut inner = Bundle::new("Inner", dec!(0), 1).unwrap();
        let deep = inner.add(item("A", dec!(1), 1)).unwrap();
        let mut outer = Bundle::new("Outer", dec!(0), 1).unwrap();
        outer.add(inner).unwrap();

        assert!(outer.remove(deep).is_none());
        assert_eq!(Node::from(outer).flatten_items().len(), 1);
    }

    #[test]
    fn test_value_reflects_mutation() {
        let mut bundle = Bundle::new("B", dec!(0.5), 1).unwrap();
        bundle.add(item("A", dec!(10), 1)).unwrap();
        assert_eq!(bundle.aggregate_value(), Money::new(dec!(5)));

        let b = bundle.add(item("B", dec!(10), 1)).unwrap();
        assert_eq!(bundle.aggregate_value(), Money::new(dec!(10)));

        bundle.remove(b);
        assert_eq!(bundle.aggregate_value(), Money::new(dec!(5)));
    }

    #[test]
    fn test_bundle_constructor_validation() {
        assert!(matches!(
            Bundle::new("B", dec!(1), 1),
            Err(ValidationError::InvalidDiscount { .. })
        ));
        assert!(matches!(
            Bundle::new("B", dec!(-0.01), 1),
            Err(ValidationError::InvalidDiscount { .. })
        ));
        assert!(matches!(
            Bundle::new("B", dec!(0), 0),
            Err(ValidationError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            Bundle::new(" ", dec!(0), 1),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_depth_tracking() {
        let mut inner = Bundle::new("Inner", dec!(0), 1).unwrap();
        inner.add(item("A", dec!(1), 1)).unwrap();
        assert_eq!(Node::from(inner.clone()).depth(), 2);

        let mut outer = Bundle::new("Outer", dec!(0), 1).unwrap();
        let inner_id = outer.add(inner).unwrap();
        assert_eq!(Node::from(outer.clone()).depth(), 3);

        outer.remove(inner_id);
        assert_eq!(Node::from(outer).depth(), 1);
    }

    #[test]
    fn test_multiplied_bundles_reject_overflowing_child() {
        // 1000 × (2³² − 1) × (2³² − 1) ≈ 1.8e22 still fits
        let case: Node = Bundle::new("case", dec!(0), u32::MAX)
            .unwrap()
            .with(item("A", dec!(1000), u32::MAX))
            .unwrap()
            .into();
        let case_value = case.aggregate_value();

        // ... one more multiplier of 2³² − 1 does not
        let mut pallet = Bundle::new("pallet", dec!(0), u32::MAX).unwrap();
        assert_eq!(
            pallet.add(case),
            Err(ValidationError::AmountOverflow {
                field: "bundle value".to_string()
            })
        );
        assert!(pallet.is_empty());
        assert!(pallet.aggregate_value().is_zero());

        // The same case fits under a single-unit bundle.
        let case: Node = Bundle::new("case", dec!(0), u32::MAX)
            .unwrap()
            .with(item("A", dec!(1000), u32::MAX))
            .unwrap()
            .into();
        let single = Bundle::new("single", dec!(0), 1).unwrap().with(case).unwrap();
        assert_eq!(single.aggregate_value(), case_value);
    }

    #[test]
    fn test_many_children_reject_overflowing_sum() {
        let big = || item("BIG", Decimal::MAX, 1);
        let mut bundle = Bundle::new("Hoard", dec!(0), 1).unwrap();
        bundle.add(big()).unwrap();

        assert!(matches!(
            bundle.add(big()),
            Err(ValidationError::AmountOverflow { .. })
        ));
        assert_eq!(bundle.children().len(), 1);
        assert_eq!(bundle.aggregate_value(), Money::new(Decimal::MAX));
    }

    #[test]
    fn test_depth_limit_enforced() {
        let mut node: Node = Bundle::new("level", dec!(0), 1).unwrap().into();
        for _ in 1..MAX_TREE_DEPTH {
            let mut parent = Bundle::new("level", dec!(0), 1).unwrap();
            parent.add(node).unwrap();
            node = parent.into();
        }
        assert_eq!(node.depth(), MAX_TREE_DEPTH);

        let mut too_far = Bundle::new("level", dec!(0), 1).unwrap();
        assert_eq!(
            too_far.add(node),
            Err(ValidationError::TooDeep {
                max: MAX_TREE_DEPTH
            })
        );
        assert!(too_far.is_empty());
    }
}
