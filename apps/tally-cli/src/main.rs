//! Tally CLI - price a cart from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Price an order as of today
//! tally price order.toml
//!
//! # Price it as of a given date, with a custom pricing file, as JSON
//! tally price order.toml --date 2026-10-16 --config pricing.toml --json
//!
//! # Show the effective pricing configuration
//! tally config
//! ```
//!
//! Logs go to stderr (`RUST_LOG` controls the filter); stdout carries only
//! the result.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod order;
mod report;

use error::{CliError, CliResult};
use order::OrderFile;

#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about = "Price shopping carts of items and bundles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price an order file
    Price {
        /// Order file (TOML)
        order: PathBuf,

        /// Pricing config file (defaults to the user config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pricing date for birthday checks (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective pricing configuration
    Config {
        /// Pricing config file (defaults to the user config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tally=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Price {
            order,
            config,
            date,
            json,
        } => {
            let pricing = config::load(config)?;
            let pricing_date = match date {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };

            let cart = OrderFile::load(&order)?.build_cart(&pricing, pricing_date)?;
            let summary = cart.summary();
            info!(
                subtotal = %summary.subtotal,
                total = %summary.total,
                rules = summary.steps.len(),
                "Priced order"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", report::render(&summary));
            }
        }
        Commands::Config { config } => {
            let pricing = config::load(config)?;
            print!("{}", toml::to_string_pretty(&pricing)?);
        }
    }
    Ok(())
}

fn parse_date(raw: &str) -> CliResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| CliError::InvalidArgument {
        field: "--date".to_string(),
        reason: format!("{err} (expected YYYY-MM-DD)"),
    })
}
