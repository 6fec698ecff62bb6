//! Process-memory accessor seam
//!
//! The engine never talks to an OS directly. Callers supply a
//! [`MemoryAccessor`] implementation wrapping whatever process handle they
//! own (ptrace, `ReadProcessMemory`, a DMA bridge, a core dump); the engine
//! only ever issues bulk byte reads and region enumerations through it.

use crate::core::types::{AccessError, Address};
use crate::memory::regions::{MemoryRegion, Protection};
use std::sync::Mutex;

/// Read access to a target process's memory.
///
/// Implementations must be cheap to call repeatedly: the engine issues one
/// `read_bytes` per chunk, not per candidate. An implementation that is not
/// safe for concurrent calls can be wrapped in [`SerialAccessor`]; the
/// engine requires `Sync` and will invoke readable accessors from several
/// worker threads at once.
pub trait MemoryAccessor {
    /// Fills `buf` with the bytes at `address..address + buf.len()`.
    ///
    /// Must fill the buffer completely or fail; partial reads are an error.
    fn read_bytes(&self, address: Address, buf: &mut [u8]) -> Result<(), AccessError>;

    /// Enumerates the raw region descriptors of the target process,
    /// unfiltered. Ordering is not required; the region enumerator sorts.
    fn regions(&self) -> Result<Vec<MemoryRegion>, AccessError>;
}

/// Serializes all accessor calls through a mutex.
///
/// Use this when the underlying handle is not safe for concurrent
/// invocation; the engine's comparison and decoding work stays parallel
/// while reads are funneled through one lock.
pub struct SerialAccessor<A> {
    inner: Mutex<A>,
}

impl<A: MemoryAccessor> SerialAccessor<A> {
    /// Wraps an accessor in a serializing lock
    pub fn new(inner: A) -> Self {
        SerialAccessor {
            inner: Mutex::new(inner),
        }
    }

    /// Returns the wrapped accessor
    pub fn into_inner(self) -> A {
        self.inner.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<A: MemoryAccessor> MemoryAccessor for SerialAccessor<A> {
    fn read_bytes(&self, address: Address, buf: &mut [u8]) -> Result<(), AccessError> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.read_bytes(address, buf)
    }

    fn regions(&self) -> Result<Vec<MemoryRegion>, AccessError> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.regions()
    }
}

/// In-memory accessor over byte-buffer segments.
///
/// Stands in for a live process in tests and benches: segments play the
/// role of mapped regions, and mutating them between passes simulates the
/// target's state changing.
#[derive(Debug, Default)]
pub struct BufferAccessor {
    segments: Vec<Segment>,
}

#[derive(Debug)]
struct Segment {
    base: Address,
    bytes: Vec<u8>,
    protection: Protection,
}

impl Segment {
    fn end(&self) -> Address {
        self.base.add(self.bytes.len() as u64)
    }
}

impl BufferAccessor {
    /// Creates an accessor with no segments
    pub fn new() -> Self {
        BufferAccessor::default()
    }

    /// Adds a read-write segment at `base`
    pub fn with_segment(self, base: Address, bytes: Vec<u8>) -> Self {
        self.with_protected_segment(base, bytes, Protection::read_write())
    }

    /// Adds a segment at `base` with explicit protection
    pub fn with_protected_segment(
        mut self,
        base: Address,
        bytes: Vec<u8>,
        protection: Protection,
    ) -> Self {
        self.segments.push(Segment {
            base,
            bytes,
            protection,
        });
        self.segments.sort_by_key(|s| s.base);
        self
    }

    /// Overwrites bytes inside an existing segment, simulating the target
    /// process mutating its state between scan passes.
    pub fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), AccessError> {
        let segment = self
            .segments
            .iter_mut()
            .find(|s| s.base <= address && address.add(bytes.len() as u64) <= s.end())
            .ok_or_else(|| AccessError::read_denied(address, bytes.len()))?;
        let offset = (address.as_u64() - segment.base.as_u64()) as usize;
        segment.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Changes the protection of the segment based at `base`
    pub fn set_protection(&mut self, base: Address, protection: Protection) {
        if let Some(segment) = self.segments.iter_mut().find(|s| s.base == base) {
            segment.protection = protection;
        }
    }

    /// Removes the segment based at `base`, simulating an unmapped region
    pub fn remove_segment(&mut self, base: Address) {
        self.segments.retain(|s| s.base != base);
    }
}

impl MemoryAccessor for BufferAccessor {
    fn read_bytes(&self, address: Address, buf: &mut [u8]) -> Result<(), AccessError> {
        let end = address.add(buf.len() as u64);
        let segment = self
            .segments
            .iter()
            .find(|s| s.base <= address && end <= s.end())
            .ok_or_else(|| AccessError::read_denied(address, buf.len()))?;

        if !segment.protection.is_readable() {
            return Err(AccessError::read_denied(address, buf.len()));
        }

        let offset = (address.as_u64() - segment.base.as_u64()) as usize;
        buf.copy_from_slice(&segment.bytes[offset..offset + buf.len()]);
        Ok(())
    }

    fn regions(&self) -> Result<Vec<MemoryRegion>, AccessError> {
        Ok(self
            .segments
            .iter()
            .map(|s| MemoryRegion::new(s.base, s.bytes.len() as u64, s.protection))
            .collect())
    }
}
