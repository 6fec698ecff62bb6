//! Memory address wrapper type with hex parsing and alignment helpers

use super::error::ScanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents an address in the target process with type-safe operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub u64);

impl Address {
    /// Creates a new address from a raw value
    pub const fn new(value: u64) -> Self {
        Address(value)
    }

    /// Creates a null address (0x0)
    pub const fn null() -> Self {
        Address(0)
    }

    /// Checks if the address is null
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the address is aligned to the specified boundary
    pub const fn is_aligned(&self, alignment: u64) -> bool {
        alignment != 0 && self.0 % alignment == 0
    }

    /// Aligns the address down to the specified boundary
    pub const fn align_down(&self, alignment: u64) -> Self {
        if alignment == 0 {
            return *self;
        }
        Address(self.0 - self.0 % alignment)
    }

    /// Aligns the address up to the specified boundary
    pub const fn align_up(&self, alignment: u64) -> Self {
        if alignment == 0 {
            return *self;
        }
        let rem = self.0 % alignment;
        if rem == 0 {
            *self
        } else {
            Address(self.0 + (alignment - rem))
        }
    }

    /// Adds a byte offset to the address, saturating at the address space end
    pub const fn add(&self, offset: u64) -> Self {
        Address(self.0.saturating_add(offset))
    }

    /// Returns the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl FromStr for Address {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        // Handle hex prefix variations
        let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
        } else if s.chars().any(|c| c.is_ascii_alphabetic()) {
            // Assume hex if it contains letters
            u64::from_str_radix(s, 16)
        } else {
            // Try decimal first, then hex
            s.parse::<u64>().or_else(|_| u64::from_str_radix(s, 16))
        };

        value
            .map(Address::new)
            .map_err(|_| ScanError::invalid(format!("not a valid address: {s}")))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address::new(value)
    }
}

impl From<usize> for Address {
    fn from(value: usize) -> Self {
        Address::new(value as u64)
    }
}

/// Half-open address range `[start, end)` limiting a scan pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBounds {
    pub start: Address,
    pub end: Address,
}

impl AddressBounds {
    /// Creates bounds covering `[start, end)`
    pub const fn new(start: Address, end: Address) -> Self {
        AddressBounds { start, end }
    }

    /// Bounds covering the entire address space
    pub const fn everything() -> Self {
        AddressBounds {
            start: Address::null(),
            end: Address(u64::MAX),
        }
    }

    /// Checks if an address falls within the bounds
    pub fn contains(&self, address: Address) -> bool {
        address >= self.start && address < self.end
    }

    /// Clamps a `(base, size)` span to these bounds.
    ///
    /// Returns `None` when nothing of the span is in bounds.
    pub fn clamp(&self, base: Address, size: u64) -> Option<(Address, u64)> {
        let span_end = base.add(size);
        let start = base.max(self.start);
        let end = span_end.min(self.end);
        if start >= end {
            return None;
        }
        Some((start, end.as_u64() - start.as_u64()))
    }

    /// True when the bounds describe a non-empty range
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }
}

impl Default for AddressBounds {
    fn default() -> Self {
        AddressBounds::everything()
    }
}

impl fmt::Display for AddressBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
