//! Default configuration values for memsift

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub scanner: ScannerDefaults,
    pub store: StoreDefaults,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub worker_threads: usize,
    pub chunk_size: usize,
    pub batch_size: usize,
}

/// Default result store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDefaults {
    pub spill_threshold: usize,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        scanner: ScannerDefaults {
            worker_threads: num_cpus::get(),
            chunk_size: 65536,  // 64KB reads cap peak memory per worker
            batch_size: 4096,   // next-scan records refined per batch
        },
        store: StoreDefaults {
            spill_threshold: 1_000_000, // matches kept resident before paging out
        },
    }
}
