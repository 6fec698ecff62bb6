//! memsift: progressive memory scanning for live process inspection
//!
//! Locates unknown memory locations in an external process by sweeping its
//! readable regions for values matching a criterion (first scan), then
//! shrinking the candidate set as the process's state changes (next scans).
//! Process access is supplied by the caller through the
//! [`MemoryAccessor`] trait; the engine owns no OS bindings.
//!
//! ```
//! use memsift::{
//!     Address, BufferAccessor, ScanComparison, ScanEngine, ScanOperand, ScanSession,
//!     ScanSettings, ScanValue, ScanValueType,
//! };
//!
//! // A stand-in process image; real callers wrap a process handle instead.
//! let accessor = BufferAccessor::new()
//!     .with_segment(Address::new(0x1000), 100i32.to_le_bytes().to_vec());
//!
//! let engine = ScanEngine::new(&accessor);
//! let mut session = ScanSession::new();
//! let settings = ScanSettings::first_scan(
//!     ScanValueType::Integer,
//!     ScanComparison::Exact,
//!     ScanOperand::Value(ScanValue::Integer(100)),
//! );
//! let summary = engine.execute(&mut session, &settings).unwrap();
//! assert_eq!(summary.matches, 1);
//! ```

pub mod config;
pub mod core;
pub mod memory;
pub mod scan;

// Re-export the main types at the crate root
pub use crate::config::{Config, ConfigError, ConfigLoader, ScannerConfig, StoreConfig};
pub use crate::core::types::{
    AccessError, Address, AddressBounds, Endianness, ScanError, ScanResult, ScanValue,
    ScanValueType,
};
pub use crate::memory::{
    BufferAccessor, MemoryAccessor, MemoryRegion, Protection, RegionEnumerator, RegionFilter,
    SerialAccessor,
};
pub use crate::scan::{
    BytePattern, CancelToken, ChannelProgress, FirstScanComparer, MatchIter, NextScanComparer,
    ProgressSink, ResultStore, ScanComparison, ScanEngine, ScanMatch, ScanMode, ScanOperand,
    ScanProgress, ScanSession, ScanSettings, ScanState, ScanSummary, SharedProgress, TextEncoding,
    TextNeedle,
};
