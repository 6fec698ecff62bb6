//! Configuration loader for memsift
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,

    #[serde(default = "default_store")]
    pub store: StoreConfig,
}

/// Scanner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Worker pool size for region traversal
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Bytes read per chunk; caps peak memory per worker
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Records refined per batch on a next scan
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Result store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Match count above which records page to a spill file
    #[serde(default = "default_spill_threshold")]
    pub spill_threshold: usize,
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration or returns defaults if the file doesn't exist
    pub fn load_or_default(&self) -> Config {
        self.load().unwrap_or_else(|_| Config::default())
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    let loader = ConfigLoader::new("memsift.toml");
    Ok(loader.load_or_default())
}

// Default functions for serde
fn default_scanner() -> ScannerConfig {
    let defaults = default_config();
    ScannerConfig {
        worker_threads: defaults.scanner.worker_threads,
        chunk_size: defaults.scanner.chunk_size,
        batch_size: defaults.scanner.batch_size,
    }
}

fn default_store() -> StoreConfig {
    let defaults = default_config();
    StoreConfig {
        spill_threshold: defaults.store.spill_threshold,
    }
}

fn default_worker_threads() -> usize {
    default_config().scanner.worker_threads
}

fn default_chunk_size() -> usize {
    default_config().scanner.chunk_size
}

fn default_batch_size() -> usize {
    default_config().scanner.batch_size
}

fn default_spill_threshold() -> usize {
    default_config().store.spill_threshold
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scanner: default_scanner(),
            store: default_store(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.scanner.worker_threads > 0);
        assert_eq!(config.scanner.chunk_size, 65536);
        assert_eq!(config.store.spill_threshold, 1_000_000);
    }

    #[test]
    fn test_load_missing_file() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let result = loader.load();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_or_default() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let config = loader.load_or_default();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let config = Config::default();
        let loader = ConfigLoader::new(&config_path);

        loader.save(&config).unwrap();
        assert!(config_path.exists());

        let loaded = loader.load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
            [scanner]
            worker_threads = 2
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scanner.worker_threads, 2);
        // Check defaults are applied
        assert_eq!(config.scanner.chunk_size, 65536);
        assert_eq!(config.store.spill_threshold, 1_000_000);
    }
}
