//! Portable memory protection flags
//!
//! Accessor implementations translate their platform's page protection
//! constants into this flag set; the engine never sees OS values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Protection flags for a memory region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Protection {
    bits: u8,
}

impl Protection {
    pub const READ: u8 = 0x01;
    pub const WRITE: u8 = 0x02;
    pub const EXECUTE: u8 = 0x04;
    pub const GUARD: u8 = 0x08;

    /// Create protection flags from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Protection { bits }
    }

    /// No access
    pub const fn none() -> Self {
        Protection::from_bits(0)
    }

    /// Read-only protection
    pub const fn read() -> Self {
        Protection::from_bits(Self::READ)
    }

    /// Read-write protection
    pub const fn read_write() -> Self {
        Protection::from_bits(Self::READ | Self::WRITE)
    }

    /// Read-execute protection
    pub const fn read_execute() -> Self {
        Protection::from_bits(Self::READ | Self::EXECUTE)
    }

    /// Read-write-execute protection
    pub const fn read_write_execute() -> Self {
        Protection::from_bits(Self::READ | Self::WRITE | Self::EXECUTE)
    }

    /// Raw flag bits
    pub const fn bits(&self) -> u8 {
        self.bits
    }

    /// Check if protection allows reading (guard pages are not readable)
    pub const fn is_readable(&self) -> bool {
        self.bits & Self::READ != 0 && !self.is_guarded()
    }

    /// Check if protection allows writing
    pub const fn is_writable(&self) -> bool {
        self.bits & Self::WRITE != 0
    }

    /// Check if protection allows execution
    pub const fn is_executable(&self) -> bool {
        self.bits & Self::EXECUTE != 0
    }

    /// Check if the guard flag is set
    pub const fn is_guarded(&self) -> bool {
        self.bits & Self::GUARD != 0
    }

    /// Add the guard flag
    pub const fn with_guard(self) -> Self {
        Protection::from_bits(self.bits | Self::GUARD)
    }
}

impl BitOr for Protection {
    type Output = Protection;

    fn bitor(self, rhs: Protection) -> Protection {
        Protection::from_bits(self.bits | rhs.bits)
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.bits & Self::READ != 0 { 'r' } else { '-' },
            if self.is_writable() { 'w' } else { '-' },
            if self.is_executable() { 'x' } else { '-' },
            if self.is_guarded() { 'g' } else { '-' },
        )
    }
}
