//! Core module containing fundamental types for memsift
//!
//! This module provides the foundational building blocks used throughout
//! the scanning engine: address handling, scan values, and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    AccessError, Address, AddressBounds, Endianness, ScanError, ScanResult, ScanValue,
    ScanValueType,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
