//! Region enumeration with bounds, protection filtering, and merging

use crate::core::types::{AccessError, AddressBounds};
use crate::memory::accessor::MemoryAccessor;
use crate::memory::regions::MemoryRegion;
use serde::{Deserialize, Serialize};

/// Protection criteria a region must satisfy to be scanned.
///
/// Readability is always required; everything else is opt-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFilter {
    writable_only: bool,
    executable_only: bool,
    min_size: Option<u64>,
}

impl RegionFilter {
    /// Create a filter accepting every readable region
    pub fn new() -> Self {
        RegionFilter::default()
    }

    /// Require regions to be writable
    pub fn writable(mut self) -> Self {
        self.writable_only = true;
        self
    }

    /// Require regions to be executable
    pub fn executable(mut self) -> Self {
        self.executable_only = true;
        self
    }

    /// Skip regions smaller than `size` bytes
    pub fn with_min_size(mut self, size: u64) -> Self {
        self.min_size = Some(size);
        self
    }

    /// Check if a region satisfies the filter
    pub fn matches(&self, region: &MemoryRegion) -> bool {
        if !region.is_readable() {
            return false;
        }
        if self.writable_only && !region.protection.is_writable() {
            return false;
        }
        if self.executable_only && !region.protection.is_executable() {
            return false;
        }
        if let Some(min) = self.min_size {
            if region.size < min {
                return false;
            }
        }
        true
    }
}

/// Streams the scannable regions of a target process.
///
/// Descriptors are snapshotted from the accessor at construction, then
/// yielded in ascending base order, clamped to the bounds, filtered, with
/// adjacent identically-protected regions merged. The sequence is finite
/// and non-restartable; build a new enumerator for every pass.
pub struct RegionEnumerator {
    raw: std::vec::IntoIter<MemoryRegion>,
    bounds: AddressBounds,
    filter: RegionFilter,
    pending: Option<MemoryRegion>,
}

impl RegionEnumerator {
    /// Snapshots the accessor's region list.
    ///
    /// Fails with the accessor's `AccessError` if enumeration is denied;
    /// the error is propagated without retry.
    pub fn new<A: MemoryAccessor + ?Sized>(
        accessor: &A,
        bounds: AddressBounds,
        filter: RegionFilter,
    ) -> Result<Self, AccessError> {
        let mut raw = accessor.regions()?;
        raw.sort_by_key(|r| r.base);
        Ok(RegionEnumerator {
            raw: raw.into_iter(),
            bounds,
            filter,
            pending: None,
        })
    }
}

impl Iterator for RegionEnumerator {
    type Item = MemoryRegion;

    fn next(&mut self) -> Option<MemoryRegion> {
        for region in self.raw.by_ref() {
            let Some((base, size)) = self.bounds.clamp(region.base, region.size) else {
                continue;
            };
            let clamped = MemoryRegion::new(base, size, region.protection);
            if !self.filter.matches(&clamped) {
                continue;
            }

            match &mut self.pending {
                // Contiguous with identical protection: extend instead of yielding
                Some(p) if p.end() == clamped.base && p.protection == clamped.protection => {
                    p.size += clamped.size;
                }
                _ => {
                    let previous = self.pending.replace(clamped);
                    if previous.is_some() {
                        return previous;
                    }
                }
            }
        }
        self.pending.take()
    }
}
