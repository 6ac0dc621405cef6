//! # Pricing Configuration Loading
//!
//! Resolves the effective [`PricingConfig`] for a run.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_VAT_RATE=0.081                                               │
//! │     TALLY_NEW_CUSTOMER_RATE, TALLY_NEW_CUSTOMER_CAP,                   │
//! │     TALLY_BIRTHDAY_RATE                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, otherwise                                         │
//! │     ~/.config/tally/pricing.toml (Linux)                               │
//! │     ~/Library/Application Support/com.tally.tally/pricing.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use tally_core::PricingConfig;
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

/// Loads the pricing config: file (if present) → environment → validate.
pub fn load(config_path: Option<PathBuf>) -> CliResult<PricingConfig> {
    let explicit = config_path.is_some();
    let mut config = PricingConfig::default();

    if let Some(path) = config_path.or_else(default_config_path) {
        if path.exists() {
            info!(?path, "Loading pricing config from file");
            config = read_config_file(&path)?;
        } else if explicit {
            return Err(CliError::Read {
                path,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        } else {
            debug!(?path, "Config file not found, using defaults");
        }
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

fn read_config_file(path: &Path) -> CliResult<PricingConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&contents).map_err(|err| CliError::Parse {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Applies `TALLY_*` overrides. Unparseable values are logged and skipped.
///
/// `lookup` abstracts the environment so tests don't have to mutate it.
pub fn apply_env_overrides<F>(config: &mut PricingConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let overrides: [(&str, &mut Decimal); 4] = [
        ("TALLY_VAT_RATE", &mut config.vat_rate),
        ("TALLY_NEW_CUSTOMER_RATE", &mut config.new_customer_rate),
        ("TALLY_NEW_CUSTOMER_CAP", &mut config.new_customer_cap),
        ("TALLY_BIRTHDAY_RATE", &mut config.birthday_rate),
    ];

    for (key, slot) in overrides {
        let Some(raw) = lookup(key) else {
            continue;
        };
        match Decimal::from_str(raw.trim()) {
            Ok(value) => {
                debug!(key, %value, "Overriding pricing config from environment");
                *slot = value;
            }
            Err(_) => warn!(key, value = %raw, "Ignoring unparseable decimal in environment"),
        }
    }
}

/// Returns the default config file path.
fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "tally", "tally")
        .map(|dirs| dirs.config_dir().join("pricing.toml"))
}
