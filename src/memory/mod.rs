//! Target-process memory abstractions
//!
//! This module provides the seam between the scanning engine and whatever
//! owns the actual process handle:
//! - The [`MemoryAccessor`] trait the caller implements
//! - Region snapshots, protection flags, and filtered enumeration
//! - Helpers for serializing non-concurrent accessors

pub mod accessor;
pub mod regions;

pub use accessor::{BufferAccessor, MemoryAccessor, SerialAccessor};
pub use regions::{MemoryRegion, Protection, RegionEnumerator, RegionFilter};
