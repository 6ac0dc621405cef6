//! # CLI Error Type
//!
//! Everything that can go wrong between reading files and printing a total.
//!
//! ```text
//! std::io::Error ──────┐
//! toml::de::Error ─────┤
//! toml::ser::Error ────┼──► CliError ──► error! log + exit code 1
//! serde_json::Error ───┤
//! CoreError ───────────┘
//! ```

use std::path::PathBuf;

use tally_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// File could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Order or config file is not valid TOML for its schema.
    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// A `--date` value could not be parsed.
    #[error("Invalid value for {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Failed to render output: {0}")]
    Render(String),

    /// Pricing rejected the input.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::Core(CoreError::Validation(err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Render(err.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Render(err.to_string())
    }
}
