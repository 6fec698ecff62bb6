//! Memory region model and enumeration
//!
//! A region is a contiguous span of the target's address space with uniform
//! protection. Region snapshots are valid for one scan pass only and are
//! re-derived from the accessor at the start of every first scan.

pub mod enumerator;
pub mod protection;

pub use enumerator::{RegionEnumerator, RegionFilter};
pub use protection::Protection;

use crate::core::types::Address;
use serde::{Deserialize, Serialize};

/// A contiguous span of the target process's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    /// Base address of the region
    pub base: Address,
    /// Size of the region in bytes
    pub size: u64,
    /// Protection flags for the region
    pub protection: Protection,
}

impl MemoryRegion {
    /// Creates a new region snapshot
    pub const fn new(base: Address, size: u64, protection: Protection) -> Self {
        MemoryRegion {
            base,
            size,
            protection,
        }
    }

    /// Get the end address of the region (exclusive)
    pub fn end(&self) -> Address {
        self.base.add(self.size)
    }

    /// Check if an address is within this region
    pub fn contains(&self, address: Address) -> bool {
        address >= self.base && address < self.end()
    }

    /// Check if the region is readable
    pub fn is_readable(&self) -> bool {
        self.protection.is_readable()
    }
}
