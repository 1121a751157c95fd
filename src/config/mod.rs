//! Configuration management for stdin-rotate
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//! 4. Command-line flags (highest priority)
//!
//! The resulting [`Config`] is immutable and handed to the appender, the
//! maintenance worker and the forwarder at construction time.
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `STDIN_ROTATE__<section>__<key>`
//!
//! Examples:
//! - `STDIN_ROTATE__OUTPUT__MAX_SIZE=64MB`
//! - `STDIN_ROTATE__OUTPUT__COMPRESS=false`
//! - `STDIN_ROTATE__FORWARD__TARGET=logs.internal:514`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/stdin-rotate.toml`.
//! This can be overridden using `--config` or the `STDIN_ROTATE_CONFIG`
//! environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{
    Config, DEFAULT_SYSLOG_PRIORITY, ForwardConfig, MAX_SYSLOG_PRIORITY, OutputConfig,
};
pub use sources::Overrides;
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment + flags)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or the
    /// merged result fails validation.
    pub fn load(config_path: Option<PathBuf>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let config = sources::load(config_path, overrides)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, ignoring `STDIN_ROTATE_CONFIG`
    pub fn load_from_path(path: PathBuf, overrides: &Overrides) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path, overrides)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Check an in-memory configuration, e.g. one assembled by hand in tests
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }
}
