//! # tally-core: Pure Pricing Logic for Tally
//!
//! This crate prices a shopping cart: a tree of items and bundles, folded
//! into a subtotal, then pushed through an ordered pipeline of adjustment
//! rules. Zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tally-cli                                    │   │
//! │  │    order.toml ──► build cart ──► summary ──► stdout             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   tree    │  │   rules   │  │   cart    │  │  config   │  │   │
//! │  │   │   Node    │  │  Adjust-  │  │   Cart    │  │  Pricing- │  │   │
//! │  │   │  Bundle   │  │  mentRule │  │  Summary  │  │  Config   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                 │   │
//! │  │   │   money   │  │   types   │  │ validation│                 │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO FILES • NO ENVIRONMENT • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`tree`] - Pricing tree (leaves and bundles)
//! - [`rules`] - Adjustment pipeline rules and their context
//! - [`cart`] - The orchestrator: subtotal, total, bonus points
//! - [`config`] - Rule rates and thresholds
//! - [`money`] - Decimal money type
//! - [`types`] - Item and Customer
//! - [`validation`] - Construction-time checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same cart, same date, same total
//! 2. **Validate at the Boundary**: bad quantities, prices and discounts are
//!    rejected when an item or bundle is built; pricing itself cannot fail
//! 3. **Round Once**: the total is rounded to cents at the very end
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal_macros::dec;
//! use tally_core::{Bundle, Cart, Customer, Item, Money, Vat};
//!
//! let snacks = Bundle::new("Snacks", dec!(0.1), 1)
//!     .unwrap()
//!     .with(Item::new("CHIPS", "Chips", dec!(10), 1).unwrap())
//!     .unwrap()
//!     .with(Item::new("DIP", "Dip", dec!(20), 1).unwrap())
//!     .unwrap();
//!
//! let mut cart = Cart::new(Customer::new("c-1", "a@example.com"));
//! cart.add_node(snacks).unwrap();
//! cart.add_rule(Vat::default());
//!
//! assert_eq!(cart.subtotal(), Money::new(dec!(27)));
//! assert_eq!(cart.calculate_total(), Money::new(dec!(29.08)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod config;
pub mod error;
pub mod money;
pub mod rules;
pub mod tree;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartSummary, RuleStep};
pub use config::{PricingConfig, RuleKind};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use rules::{
    AdjustmentRule, BirthdayDiscount, NewCustomerDiscount, PriceContext, Vat, VolumeDiscount,
    VolumeTier,
};
pub use tree::{Bundle, Leaf, Node, NodeId};
pub use types::{Customer, Item};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum nesting depth of the pricing tree.
///
/// A lone item has depth 1; each enclosing bundle adds one. Bounds the
/// recursion of every tree walk.
pub const MAX_TREE_DEPTH: usize = 64;

/// Bonus points are multiplied by this on the customer's birthday.
pub const BIRTHDAY_BONUS_MULTIPLIER: u32 = 10;
