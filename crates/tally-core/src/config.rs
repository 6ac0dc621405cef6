//! # Pricing Configuration
//!
//! Every constant the adjustment rules use, in one serde-friendly struct.
//!
//! ## Configuration File Format
//! ```toml
//! # pricing.toml
//! new_customer_rate = 0.05
//! new_customer_cap = 100
//! birthday_rate = 0.03
//! birthday_bonus_multiplier = 10
//! vat_rate = 0.077
//!
//! [[volume_tiers]]
//! min_quantity = 10
//! rate = 0.05
//!
//! [[volume_tiers]]
//! min_quantity = 20
//! rate = 0.10
//! ```
//!
//! Missing keys fall back to the defaults. Reading the file and applying
//! environment overrides happens in the application; this module only defines
//! the shape, the defaults and validation.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::rules::{
    AdjustmentRule, BirthdayDiscount, NewCustomerDiscount, Vat, VolumeDiscount, VolumeTier,
};
use crate::BIRTHDAY_BONUS_MULTIPLIER;

// =============================================================================
// Rule Kind
// =============================================================================

/// Names of the built-in adjustment rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    NewCustomer,
    Birthday,
    Volume,
    Vat,
}

impl RuleKind {
    /// Conventional pipeline order: discounts first, tax last.
    pub const STANDARD_ORDER: [RuleKind; 4] = [
        RuleKind::NewCustomer,
        RuleKind::Birthday,
        RuleKind::Volume,
        RuleKind::Vat,
    ];
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::NewCustomer => write!(f, "new_customer"),
            RuleKind::Birthday => write!(f, "birthday"),
            RuleKind::Volume => write!(f, "volume"),
            RuleKind::Vat => write!(f, "vat"),
        }
    }
}

impl FromStr for RuleKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "new_customer" | "welcome" => Ok(RuleKind::NewCustomer),
            "birthday" => Ok(RuleKind::Birthday),
            "volume" | "bulk" => Ok(RuleKind::Volume),
            "vat" | "tax" => Ok(RuleKind::Vat),
            _ => Err(CoreError::UnknownRule(s.to_string())),
        }
    }
}

// =============================================================================
// Pricing Config
// =============================================================================

/// Rates and thresholds for the built-in rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Share of the amount taken off for new customers.
    #[serde(default = "default_new_customer_rate")]
    pub new_customer_rate: Decimal,

    /// Upper bound of the new-customer deduction.
    #[serde(default = "default_new_customer_cap")]
    pub new_customer_cap: Decimal,

    #[serde(default = "default_birthday_rate")]
    pub birthday_rate: Decimal,

    /// Bonus points are multiplied by this on the customer's birthday.
    #[serde(default = "default_birthday_bonus_multiplier")]
    pub birthday_bonus_multiplier: u32,

    #[serde(default = "default_vat_rate")]
    pub vat_rate: Decimal,

    // Kept last: TOML emits arrays of tables after plain keys.
    #[serde(default = "default_volume_tiers")]
    pub volume_tiers: Vec<VolumeTier>,
}

fn default_new_customer_rate() -> Decimal {
    NewCustomerDiscount::DEFAULT_RATE
}

fn default_new_customer_cap() -> Decimal {
    NewCustomerDiscount::DEFAULT_CAP
}

fn default_birthday_rate() -> Decimal {
    BirthdayDiscount::DEFAULT_RATE
}

fn default_birthday_bonus_multiplier() -> u32 {
    BIRTHDAY_BONUS_MULTIPLIER
}

fn default_vat_rate() -> Decimal {
    Vat::DEFAULT_RATE
}

fn default_volume_tiers() -> Vec<VolumeTier> {
    VolumeDiscount::DEFAULT_TIERS.to_vec()
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            new_customer_rate: default_new_customer_rate(),
            new_customer_cap: default_new_customer_cap(),
            birthday_rate: default_birthday_rate(),
            birthday_bonus_multiplier: default_birthday_bonus_multiplier(),
            vat_rate: default_vat_rate(),
            volume_tiers: default_volume_tiers(),
        }
    }
}

impl PricingConfig {
    /// Validates the configuration.
    ///
    /// ## Rules
    /// - Discount rates in [0, 1)
    /// - VAT rate >= 0
    /// - Cap >= 0
    /// - Birthday bonus multiplier >= 1
    /// - Every volume tier has a threshold >= 1 and a rate in [0, 1)
    pub fn validate(&self) -> CoreResult<()> {
        check_fraction("new_customer_rate", self.new_customer_rate)?;
        check_fraction("birthday_rate", self.birthday_rate)?;

        if self.new_customer_cap < Decimal::ZERO {
            return Err(CoreError::InvalidConfig(format!(
                "new_customer_cap must not be negative, got {}",
                self.new_customer_cap
            )));
        }

        if self.vat_rate < Decimal::ZERO {
            return Err(CoreError::InvalidConfig(format!(
                "vat_rate must not be negative, got {}",
                self.vat_rate
            )));
        }

        if self.birthday_bonus_multiplier == 0 {
            return Err(CoreError::InvalidConfig(
                "birthday_bonus_multiplier must be at least 1".into(),
            ));
        }

        for tier in &self.volume_tiers {
            if tier.min_quantity == 0 {
                return Err(CoreError::InvalidConfig(
                    "volume tier min_quantity must be at least 1".into(),
                ));
            }
            check_fraction("volume tier rate", tier.rate)?;
        }

        Ok(())
    }

    /// Builds one configured rule.
    ///
    /// Fails with a validation error when the rates this rule reads are out
    /// of range, even if [`validate`](Self::validate) was never called.
    pub fn build_rule(&self, kind: RuleKind) -> CoreResult<Box<dyn AdjustmentRule>> {
        let rule: Box<dyn AdjustmentRule> = match kind {
            RuleKind::NewCustomer => Box::new(NewCustomerDiscount::new(
                self.new_customer_rate,
                self.new_customer_cap,
            )?),
            RuleKind::Birthday => Box::new(BirthdayDiscount::new(self.birthday_rate)?),
            RuleKind::Volume => Box::new(VolumeDiscount::new(self.volume_tiers.clone())?),
            RuleKind::Vat => Box::new(Vat::new(self.vat_rate)?),
        };
        Ok(rule)
    }

    /// Builds rules in the given order.
    pub fn build_rules(&self, kinds: &[RuleKind]) -> CoreResult<Vec<Box<dyn AdjustmentRule>>> {
        kinds.iter().map(|&kind| self.build_rule(kind)).collect()
    }

    /// All built-in rules in [`RuleKind::STANDARD_ORDER`].
    pub fn standard_rules(&self) -> CoreResult<Vec<Box<dyn AdjustmentRule>>> {
        self.build_rules(&RuleKind::STANDARD_ORDER)
    }
}

fn check_fraction(field: &str, value: Decimal) -> CoreResult<()> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(CoreError::InvalidConfig(format!(
            "{} must be in [0, 1), got {}",
            field, value
        )));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
