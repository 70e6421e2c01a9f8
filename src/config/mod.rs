//! Configuration management for fetchkit
//!
//! Settings are layered from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use fetchkit::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Fetching with {} workers", config.fetcher.workers);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `FETCHKIT__<section>__<key>`:
//! - `FETCHKIT__FETCHER__WORKERS=4`
//! - `FETCHKIT__FETCHER__WRITE_BUFFER=1MB`
//! - `FETCHKIT__OUTPUT__DIR=/data/kernels`
//!
//! # Configuration File
//!
//! By default the file is read from `config/fetchkit.toml`.
//! `FETCHKIT_CONFIG` points somewhere else.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{
    CatalogConfig, Config, DuplicatePolicy, FetcherConfig, OutputConfig, default_workers,
};
pub use validation::{MAX_WRITE_BUFFER, ValidationError};

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value
    /// fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let config = sources::load_from_path(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Validate a configuration assembled in code
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("fetchkit.toml");

        fs::write(
            &config_path,
            r#"
[fetcher]
workers = 4
            "#,
        )
        .unwrap();

        let config = Config::load_from_path(&config_path).unwrap();
        assert_eq!(config.fetcher.workers, 4);
        assert_eq!(config.output.duplicate_destinations, DuplicatePolicy::Reject);
    }

    #[test]
    fn test_validation_runs_after_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("fetchkit.toml");

        fs::write(
            &config_path,
            r#"
[fetcher]
workers = 0
            "#,
        )
        .unwrap();

        let result = Config::load_from_path(&config_path);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError(ValidationError::NoWorkers))
        ));
    }

    #[test]
    fn test_huge_write_buffer_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("fetchkit.toml");

        fs::write(
            &config_path,
            r#"
[fetcher]
write_buffer = "4096TB"
            "#,
        )
        .unwrap();

        let result = Config::load_from_path(&config_path);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError(
                ValidationError::WriteBufferTooLarge(_)
            ))
        ));
    }

    #[test]
    fn test_overflowing_write_buffer_is_a_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("fetchkit.toml");

        fs::write(
            &config_path,
            r#"
[fetcher]
write_buffer = "20000000TB"
            "#,
        )
        .unwrap();

        assert!(matches!(
            Config::load_from_path(&config_path),
            Err(ConfigError::LoadError(_))
        ));
    }
}
