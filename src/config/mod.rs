//! Configuration module for memsift
//!
//! Provides configuration loading, validation, and default settings for
//! the scan engine: worker pool size, chunk size, next-scan batch size,
//! and the result store spill threshold.

mod defaults;
mod loader;
mod validator;

pub use defaults::{default_config, ConfigDefaults};
pub use loader::{load_config, Config, ConfigError, ConfigLoader, ScannerConfig, StoreConfig};
pub use validator::{validate_config, ConfigValidator};

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;
