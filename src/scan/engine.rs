//! Scan engine: concurrent first-scan traversal and next-scan refinement
//!
//! First scans partition the enumerated regions across a worker pool and
//! read each region in bounded chunks; next scans walk the existing result
//! store only, so their cost is proportional to the match count rather than
//! the address space. Cancellation is cooperative and checked at chunk and
//! batch boundaries.

use crate::config::Config;
use crate::core::types::{AccessError, Address, ScanError, ScanResult};
use crate::memory::accessor::MemoryAccessor;
use crate::memory::regions::{MemoryRegion, RegionEnumerator};
use crate::scan::comparer::{FirstScanComparer, NextScanComparer};
use crate::scan::progress::{ProgressSink, ScanProgress};
use crate::scan::session::{CancelToken, ScanSession, ScanState};
use crate::scan::settings::{ScanMode, ScanSettings};
use crate::scan::store::{RawRecord, StoreBuilder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one scan pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub state: ScanState,
    /// Pass number of the session after this scan
    pub pass: u32,
    /// Matches in the session's store after this scan
    pub matches: usize,
    /// True when the result cap stopped the scan early
    pub truncated: bool,
}

/// Orchestrates scan passes against one accessor.
///
/// The engine is stateless between calls; all scan state lives in the
/// caller's [`ScanSession`]. Several engines (or several sessions through
/// one engine) may run concurrently against the same accessor.
pub struct ScanEngine<'a, A: MemoryAccessor + Sync> {
    accessor: &'a A,
    config: Config,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl<'a, A: MemoryAccessor + Sync> ScanEngine<'a, A> {
    /// Creates an engine with default configuration
    pub fn new(accessor: &'a A) -> Self {
        ScanEngine {
            accessor,
            config: Config::default(),
            progress: None,
        }
    }

    /// Creates an engine with an explicit configuration
    pub fn with_config(accessor: &'a A, config: Config) -> Self {
        ScanEngine {
            accessor,
            config,
            progress: None,
        }
    }

    /// Attaches a progress sink; snapshots are pushed as the scan proceeds
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Runs the scan described by `settings`, dispatching on its mode
    pub fn execute(
        &self,
        session: &mut ScanSession,
        settings: &ScanSettings,
    ) -> ScanResult<ScanSummary> {
        match settings.mode {
            ScanMode::First => self.first_scan(session, settings),
            ScanMode::Next => self.next_scan(session, settings),
        }
    }

    /// First scan: sweeps the readable regions within the configured bounds.
    ///
    /// All-or-nothing: any read error aborts the pass into `Failed` and the
    /// partial result is discarded.
    pub fn first_scan(
        &self,
        session: &mut ScanSession,
        settings: &ScanSettings,
    ) -> ScanResult<ScanSummary> {
        settings.validate()?;
        if settings.mode != ScanMode::First {
            return Err(ScanError::invalid("first_scan requires ScanMode::First"));
        }
        let comparer = FirstScanComparer::compile(settings)?;
        let pool = self.build_pool(settings)?;

        session.begin_first_scan();
        let cancel = session.cancel_token();

        let regions: Vec<MemoryRegion> =
            match RegionEnumerator::new(self.accessor, settings.bounds, settings.region_filter) {
                Ok(enumerator) => enumerator.collect(),
                Err(e) => {
                    session.fail();
                    return Err(e.into());
                }
            };
        let total_regions = regions.len();
        let cap = settings.max_results.unwrap_or(usize::MAX);
        debug!(
            regions = total_regions,
            value_type = %settings.value_type,
            "first scan starting"
        );

        let found = AtomicUsize::new(0);
        let regions_done = AtomicUsize::new(0);

        let scanned: Result<Vec<RegionMatches>, AccessError> = pool.install(|| {
            regions
                .par_iter()
                .map(|region| {
                    let local = self.scan_region(region, &comparer, settings, &cancel, &found, cap);
                    let done = regions_done.fetch_add(1, Ordering::Relaxed) + 1;
                    self.report(done, total_regions, found.load(Ordering::Relaxed).min(cap));
                    local
                })
                .collect()
        });

        let scanned = match scanned {
            Ok(scanned) => scanned,
            Err(e) => {
                session.fail();
                return Err(e.into());
            }
        };

        // Merge partition-local buffers in region order, trimming at the cap
        let width = comparer.width();
        let mut builder = StoreBuilder::new(
            settings.value_type,
            width,
            settings.endianness,
            self.config.store.spill_threshold,
        );
        'merge: for local in &scanned {
            for (address, value) in local.iter() {
                if builder.len() >= cap {
                    break 'merge;
                }
                if let Err(e) = builder.push(address, value, value) {
                    session.fail();
                    return Err(e);
                }
            }
        }
        let truncated = found.load(Ordering::Relaxed) > cap;
        let cancelled = cancel.is_cancelled();

        let state = if cancelled {
            ScanState::Cancelled
        } else {
            ScanState::Completed
        };
        let store = match builder.finish(false, truncated, !cancelled) {
            Ok(store) => store,
            Err(e) => {
                session.fail();
                return Err(e);
            }
        };

        let matches = store.len();
        self.report(total_regions, total_regions, matches);
        debug!(matches, ?state, "first scan finished");
        session.install_first(store, state, settings.value_type);
        Ok(ScanSummary {
            state,
            pass: session.pass(),
            matches,
            truncated,
        })
    }

    /// Next scan: re-reads only the session's current matches and keeps
    /// those whose value change satisfies the comparison.
    ///
    /// Unreadable addresses drop their match and nothing else.
    pub fn next_scan(
        &self,
        session: &mut ScanSession,
        settings: &ScanSettings,
    ) -> ScanResult<ScanSummary> {
        settings.validate()?;
        if settings.mode != ScanMode::Next {
            return Err(ScanError::invalid("next_scan requires ScanMode::Next"));
        }
        let comparer = NextScanComparer::compile(settings)?;
        let pool = self.build_pool(settings)?;

        let old = session.begin_next_scan(settings.value_type)?;
        let cancel = session.cancel_token();
        let width = comparer.width().unwrap_or_else(|| old.value_width());
        let total = old.len();
        let cap = settings.max_results.unwrap_or(usize::MAX);
        let batch_size = self.config.scanner.batch_size;
        debug!(matches = total, "next scan starting");

        let mut builder = StoreBuilder::new(
            old.value_type(),
            old.value_width(),
            settings.endianness,
            self.config.store.spill_threshold,
        );

        let mut records = match old.raw_iter() {
            Ok(records) => records,
            Err(e) => {
                session.fail();
                return Err(e);
            }
        };

        let mut done = 0usize;
        let mut truncated = false;
        loop {
            // Batch boundary doubles as the cancellation check point
            if cancel.is_cancelled() {
                break;
            }

            let mut batch = Vec::with_capacity(batch_size);
            for record in records.by_ref().take(batch_size) {
                match record {
                    Ok(record) => batch.push(record),
                    Err(e) => {
                        session.fail();
                        return Err(e);
                    }
                }
            }
            if batch.is_empty() {
                break;
            }

            let groups = group_batch(&batch, width, self.config.scanner.chunk_size);
            let survivors: Vec<Vec<Survivor>> = pool.install(|| {
                groups
                    .par_iter()
                    .map(|group| self.refine_group(group, &comparer, width))
                    .collect()
            });

            done += batch.len();
            for survivor in survivors.into_iter().flatten() {
                if builder.len() >= cap {
                    truncated = true;
                    break;
                }
                if let Err(e) = builder.push(survivor.address, &survivor.current, &survivor.previous)
                {
                    session.fail();
                    return Err(e);
                }
            }
            self.report(done, total, builder.len());
            if truncated {
                break;
            }
        }

        let cancelled = cancel.is_cancelled();
        let state = if cancelled {
            ScanState::Cancelled
        } else {
            ScanState::Completed
        };
        let store = match builder.finish(true, truncated, !cancelled) {
            Ok(store) => store,
            Err(e) => {
                session.fail();
                return Err(e);
            }
        };

        let matches = store.len();
        self.report(total, total, matches);
        debug!(matches, ?state, "next scan finished");
        session.install_next(store, state);
        Ok(ScanSummary {
            state,
            pass: session.pass(),
            matches,
            truncated,
        })
    }

    /// Scans one region in bounded chunks, collecting matches locally.
    ///
    /// Chunks overlap by `width - 1` bytes; a window is only emitted by the
    /// chunk containing its first byte, so boundary matches appear once.
    fn scan_region(
        &self,
        region: &MemoryRegion,
        comparer: &FirstScanComparer,
        settings: &ScanSettings,
        cancel: &CancelToken,
        found: &AtomicUsize,
        cap: usize,
    ) -> Result<RegionMatches, AccessError> {
        let width = comparer.width() as u64;
        let chunk_size = self.config.scanner.chunk_size as u64;
        let mut local = RegionMatches::new(comparer.width());
        let mut buf = Vec::new();

        let mut chunk_start = 0u64;
        'chunks: while chunk_start < region.size {
            if cancel.is_cancelled() || found.load(Ordering::Relaxed) >= cap {
                break;
            }

            let read_len = (chunk_size + width - 1).min(region.size - chunk_start);
            if read_len < width {
                break;
            }
            let base = region.base.add(chunk_start);
            buf.resize(read_len as usize, 0);
            self.accessor.read_bytes(base, &mut buf)?;

            let mut offset = base.align_up(settings.alignment).as_u64() - base.as_u64();
            while offset < chunk_size && offset + width <= read_len {
                let window = &buf[offset as usize..(offset + width) as usize];
                if comparer.test(window) {
                    let emitted = found.fetch_add(1, Ordering::Relaxed);
                    if emitted >= cap {
                        break 'chunks;
                    }
                    local.push(base.as_u64() + offset, window);
                }
                offset += settings.alignment;
            }

            chunk_start += chunk_size;
        }

        Ok(local)
    }

    /// Re-reads one group of nearby matches with a single bulk read,
    /// falling back to per-address reads if the bulk read fails.
    fn refine_group(
        &self,
        group: &[RawRecord],
        comparer: &NextScanComparer,
        width: usize,
    ) -> Vec<Survivor> {
        let mut survivors = Vec::new();
        let Some(first) = group.first() else {
            return survivors;
        };
        let Some(last) = group.last() else {
            return survivors;
        };

        let span = (last.address + width as u64 - first.address) as usize;
        let mut buf = vec![0u8; span];

        if self.accessor.read_bytes(Address::new(first.address), &mut buf).is_ok() {
            for record in group {
                let offset = (record.address - first.address) as usize;
                let window = &buf[offset..offset + width];
                if comparer.test(window, &record.current) {
                    survivors.push(Survivor {
                        address: record.address,
                        current: window.to_vec(),
                        previous: record.current.clone(),
                    });
                }
            }
            return survivors;
        }

        // Bulk read failed; isolate the genuinely unreadable addresses
        let mut window = vec![0u8; width];
        for record in group {
            match self.accessor.read_bytes(Address::new(record.address), &mut window) {
                Ok(()) => {
                    if comparer.test(&window, &record.current) {
                        survivors.push(Survivor {
                            address: record.address,
                            current: window.clone(),
                            previous: record.current.clone(),
                        });
                    }
                }
                Err(e) => {
                    warn!(
                        address = %Address::new(record.address),
                        error = %e,
                        "dropping unreadable match"
                    );
                }
            }
        }
        survivors
    }

    fn build_pool(&self, settings: &ScanSettings) -> ScanResult<rayon::ThreadPool> {
        let threads = settings
            .worker_threads
            .unwrap_or(self.config.scanner.worker_threads);
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| ScanError::WorkerPool(e.to_string()))
    }

    fn report(&self, done: usize, total: usize, matches: usize) {
        if let Some(sink) = &self.progress {
            sink.report(ScanProgress {
                done,
                total,
                matches,
            });
        }
    }
}

/// Partition-local match buffer: packed values keyed by address
struct RegionMatches {
    width: usize,
    addresses: Vec<u64>,
    values: Vec<u8>,
}

impl RegionMatches {
    fn new(width: usize) -> Self {
        RegionMatches {
            width,
            addresses: Vec::new(),
            values: Vec::new(),
        }
    }

    fn push(&mut self, address: u64, value: &[u8]) {
        self.addresses.push(address);
        self.values.extend_from_slice(value);
    }

    fn iter(&self) -> impl Iterator<Item = (u64, &[u8])> {
        self.addresses
            .iter()
            .copied()
            .zip(self.values.chunks_exact(self.width.max(1)))
    }
}

struct Survivor {
    address: u64,
    current: Vec<u8>,
    previous: Vec<u8>,
}

/// Splits one sorted record batch into groups whose address span fits a
/// single bulk read.
fn group_batch(records: &[RawRecord], width: usize, span_limit: usize) -> Vec<&[RawRecord]> {
    let mut groups = Vec::new();
    if records.is_empty() {
        return groups;
    }

    let mut start = 0;
    for i in 1..records.len() {
        let span = records[i].address + width as u64 - records[start].address;
        if span > span_limit as u64 {
            groups.push(&records[start..i]);
            start = i;
        }
    }
    groups.push(&records[start..]);
    groups
}
