//! Configuration management and validation.
//!
//! Provides configuration structures for parsing tolerances, netCDF export
//! behaviour and conversion concurrency, with environment overrides layered
//! over defaults.

use crate::constants::{
    DEFAULT_BAD_FLAG_EPSILON, ENV_BAD_FLAG_EPSILON, ENV_WORKERS, netcdf::DEFAULT_DIMENSION_NAME,
    netcdf::NC_FILL_DOUBLE,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// CNV parsing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Relative tolerance when matching cells against the bad flag
    pub bad_flag_epsilon: f64,

    /// Re-split lines into fixed 11-character fields when whitespace
    /// splitting yields the wrong arity
    pub fixed_width_fallback: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            bad_flag_epsilon: DEFAULT_BAD_FLAG_EPSILON,
            fixed_width_fallback: true,
        }
    }
}

impl ParserConfig {
    /// Set the bad-flag epsilon
    pub fn with_bad_flag_epsilon(mut self, epsilon: f64) -> Self {
        self.bad_flag_epsilon = epsilon;
        self
    }

    /// Disable the fixed-width fallback for run-together fields
    pub fn without_fixed_width_fallback(mut self) -> Self {
        self.fixed_width_fallback = false;
        self
    }

    /// Validate parser settings
    pub fn validate(&self) -> Result<()> {
        if !self.bad_flag_epsilon.is_finite() || self.bad_flag_epsilon < 0.0 {
            return Err(Error::configuration(format!(
                "Bad flag epsilon must be a finite non-negative number, got {}",
                self.bad_flag_epsilon
            )));
        }
        Ok(())
    }
}

/// netCDF export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Value written in place of missing cells
    pub fill_value: f64,

    /// Replace an existing destination file atomically; when false an
    /// existing destination is an error
    pub overwrite: bool,

    /// Name of the row dimension
    pub dimension_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fill_value: NC_FILL_DOUBLE,
            overwrite: true,
            dimension_name: DEFAULT_DIMENSION_NAME.to_string(),
        }
    }
}

impl ExportConfig {
    /// Allow replacing existing destination files
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Use a custom fill value for missing cells
    pub fn with_fill_value(mut self, fill_value: f64) -> Self {
        self.fill_value = fill_value;
        self
    }

    /// Use a custom row dimension name
    pub fn with_dimension_name(mut self, name: impl Into<String>) -> Self {
        self.dimension_name = name.into();
        self
    }

    /// Validate export settings
    pub fn validate(&self) -> Result<()> {
        if self.dimension_name.trim().is_empty() {
            return Err(Error::configuration("Dimension name cannot be empty"));
        }
        if self.fill_value.is_nan() {
            return Err(Error::configuration("Fill value cannot be NaN"));
        }
        Ok(())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Parsing settings
    pub parser: ParserConfig,

    /// Export settings
    pub export: ExportConfig,

    /// Number of files converted concurrently
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            export: ExportConfig::default(),
            workers: num_cpus::get(),
        }
    }
}

impl Config {
    /// Defaults overridden by `SEABIRD_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_BAD_FLAG_EPSILON) {
            config.parser.bad_flag_epsilon = raw.trim().parse().map_err(|_| {
                Error::configuration(format!(
                    "{} must be a number, got '{}'",
                    ENV_BAD_FLAG_EPSILON, raw
                ))
            })?;
            debug!("Bad flag epsilon from environment: {}", raw);
        }

        if let Ok(raw) = std::env::var(ENV_WORKERS) {
            config.workers = raw.trim().parse().map_err(|_| {
                Error::configuration(format!(
                    "{} must be a positive integer, got '{}'",
                    ENV_WORKERS, raw
                ))
            })?;
            debug!("Workers from environment: {}", raw);
        }

        config.validate()?;
        Ok(config)
    }

    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Replace the parser settings
    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    /// Replace the export settings
    pub fn with_export(mut self, export: ExportConfig) -> Self {
        self.export = export;
        self
    }

    /// Validate all settings
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::configuration(
                "Number of workers must be greater than 0",
            ));
        }
        self.parser.validate()?;
        self.export.validate()
    }
}
