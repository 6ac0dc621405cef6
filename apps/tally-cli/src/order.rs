//! # Order Files
//!
//! A TOML description of one customer's cart.
//!
//! ## Format
//! ```toml
//! rules = ["new_customer", "volume", "vat"]
//!
//! [customer]
//! id = "c-42"
//! email = "ada@example.com"
//! new = true
//! birthday = "1990-10-16"    # quoted, YYYY-MM-DD
//!
//! [[lines]]                  # a plain item
//! id = "COFFEE"
//! name = "Coffee beans"
//! price = 24.50
//! quantity = 2
//! bonus = true
//!
//! [[lines]]                  # a bundle
//! bundle = "Breakfast set"
//! discount = 0.1
//!
//!   [[lines.lines]]
//!   id = "MUG"
//!   name = "Mug"
//!   price = 12
//!
//!   [[lines.lines]]
//!   id = "JAM"
//!   name = "Jam"
//!   price = 4.90
//!   sale = true
//! ```
//!
//! A line with a `bundle` key is a bundle; anything else is an item. The
//! shape is picked from that key before the fields are read, so a misspelt
//! key is reported by name instead of as a line matching neither shape.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use tally_core::{
    Bundle, Cart, Customer, Item, Node, PricingConfig, RuleKind, ValidationError, MAX_TREE_DEPTH,
};
use tracing::info;

use crate::error::{CliError, CliResult};

// =============================================================================
// File Schema
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderFile {
    pub customer: CustomerSpec,

    /// Pipeline, in order. Empty means no adjustments.
    #[serde(default)]
    pub rules: Vec<RuleKind>,

    #[serde(default)]
    pub lines: Vec<LineSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerSpec {
    pub id: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub new: bool,

    #[serde(default)]
    pub birthday: Option<NaiveDate>,

    #[serde(default)]
    pub bonus_points: u64,
}

#[derive(Debug)]
pub enum LineSpec {
    Bundle(BundleSpec),
    Item(ItemSpec),
}

impl<'de> Deserialize<'de> for LineSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let table = toml::Table::deserialize(deserializer)?;
        let is_bundle = table.contains_key("bundle");
        let value = toml::Value::Table(table);

        if is_bundle {
            BundleSpec::deserialize(value)
                .map(LineSpec::Bundle)
                .map_err(de::Error::custom)
        } else {
            ItemSpec::deserialize(value)
                .map(LineSpec::Item)
                .map_err(de::Error::custom)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleSpec {
    pub bundle: String,

    #[serde(default)]
    pub discount: Decimal,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    #[serde(default)]
    pub lines: Vec<LineSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemSpec {
    pub id: String,

    pub name: String,

    pub price: Decimal,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    #[serde(default)]
    pub sale: bool,

    #[serde(default)]
    pub bonus: bool,
}

fn default_quantity() -> u32 {
    1
}

// =============================================================================
// Loading
// =============================================================================

impl OrderFile {
    pub fn load(path: &Path) -> CliResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let order: OrderFile = toml::from_str(&contents).map_err(|err| CliError::Parse {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        info!(?path, lines = order.lines.len(), rules = order.rules.len(), "Loaded order");
        Ok(order)
    }

    /// Builds the cart with the order's rules, configured from `config`.
    pub fn build_cart(&self, config: &PricingConfig, pricing_date: NaiveDate) -> CliResult<Cart> {
        let mut cart = Cart::new(self.customer.to_customer())
            .with_pricing_date(pricing_date)
            .with_birthday_bonus_multiplier(config.birthday_bonus_multiplier);

        for line in &self.lines {
            cart.add_node(line.to_node(1)?)?;
        }

        for rule in config.build_rules(&self.rules)? {
            cart.add_boxed_rule(rule);
        }

        Ok(cart)
    }
}

impl CustomerSpec {
    fn to_customer(&self) -> Customer {
        let mut customer = Customer::new(&self.id, &self.email).new_customer(self.new);
        customer.birthday = self.birthday;
        customer.bonus_points = self.bonus_points;
        customer
    }
}

impl LineSpec {
    /// `depth` is the depth this line would sit at; checked before recursing
    /// so a hostile file can't blow the stack.
    fn to_node(&self, depth: usize) -> CliResult<Node> {
        if depth > MAX_TREE_DEPTH {
            return Err(ValidationError::TooDeep {
                max: MAX_TREE_DEPTH,
            }
            .into());
        }

        match self {
            LineSpec::Item(spec) => {
                let item = Item::new(&spec.id, &spec.name, spec.price, spec.quantity)?
                    .on_sale(spec.sale)
                    .bonus_eligible(spec.bonus);
                Ok(Node::leaf(item))
            }
            LineSpec::Bundle(spec) => {
                let mut bundle = Bundle::new(&spec.bundle, spec.discount, spec.quantity)?;
                for child in &spec.lines {
                    bundle.add(child.to_node(depth + 1)?)?;
                }
                Ok(bundle.into())
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
