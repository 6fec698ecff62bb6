//! Configuration validator for memsift
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_store(&config.store)?;
        Ok(())
    }

    /// Validates scanner configuration
    fn validate_scanner(scanner: &super::loader::ScannerConfig) -> Result<(), ConfigError> {
        if scanner.worker_threads == 0 {
            return Err(ConfigError::Invalid(
                "Worker threads must be at least 1".to_string(),
            ));
        }

        if scanner.worker_threads > 128 {
            return Err(ConfigError::Invalid(
                "Worker threads cannot exceed 128".to_string(),
            ));
        }

        // Chunked reads must be page-friendly
        if scanner.chunk_size == 0 || !scanner.chunk_size.is_power_of_two() {
            return Err(ConfigError::Invalid(
                "Chunk size must be a power of 2".to_string(),
            ));
        }

        if scanner.chunk_size < 4096 {
            return Err(ConfigError::Invalid(
                "Chunk size must be at least 4096 bytes".to_string(),
            ));
        }

        if scanner.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "Batch size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates result store configuration
    fn validate_store(store: &super::loader::StoreConfig) -> Result<(), ConfigError> {
        if store.spill_threshold == 0 {
            return Err(ConfigError::Invalid(
                "Spill threshold must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
