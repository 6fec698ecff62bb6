//! Error types for the scanning engine

use super::Address;
use thiserror::Error;

/// Error raised by the process-memory accessor.
///
/// `ReadDenied` is a per-address condition: during a next scan it drops the
/// affected match and nothing else. `ProcessLost` and `EnumerationDenied`
/// are process-level conditions and abort the scan that hit them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("process handle is no longer valid: {0}")]
    ProcessLost(String),

    #[error("read denied at {address} ({length} bytes)")]
    ReadDenied { address: Address, length: usize },

    #[error("region enumeration denied: {0}")]
    EnumerationDenied(String),
}

impl AccessError {
    /// Creates a read-denied error for an address range
    pub fn read_denied(address: Address, length: usize) -> Self {
        AccessError::ReadDenied { address, length }
    }

    /// True if the target process itself is gone, not just one address
    pub fn is_process_level(&self) -> bool {
        matches!(
            self,
            AccessError::ProcessLost(_) | AccessError::EnumerationDenied(_)
        )
    }
}

/// Main error type for scan operations
#[derive(Error, Debug)]
pub enum ScanError {
    /// Rejected before any scan work begins; no side effects.
    #[error("invalid scan settings: {0}")]
    InvalidSettings(String),

    /// A Cancelled, Failed, or never-scanned session was passed to a next scan.
    #[error("scan session is not usable: {0}")]
    SessionNotUsable(String),

    /// Process-level access failure; fatal to the scan that hit it.
    #[error("memory access failed: {0}")]
    Access(#[from] AccessError),

    /// Result store spill file I/O failure.
    #[error("result store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker pool could not be built: {0}")]
    WorkerPool(String),
}

impl ScanError {
    /// Creates an invalid-settings error
    pub fn invalid(reason: impl Into<String>) -> Self {
        ScanError::InvalidSettings(reason.into())
    }
}

/// Result type alias for scan operations
pub type ScanResult<T> = Result<T, ScanError>;
