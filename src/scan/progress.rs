//! Scan progress reporting
//!
//! The engine pushes periodic snapshots to a [`ProgressSink`]; it owns no
//! presentation surface. Two sinks ship with the crate: a channel-backed
//! one for event-driven consumers and a pollable shared-state one.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

/// Snapshot of a running scan.
///
/// On a first scan `done`/`total` count regions; on a next scan they count
/// matches processed. `matches` is the number of matches found so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanProgress {
    pub done: usize,
    pub total: usize,
    pub matches: usize,
}

impl ScanProgress {
    /// Completed fraction in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.done as f64 / self.total as f64
    }
}

/// Receives progress snapshots as a scan proceeds.
///
/// Called from worker threads; implementations must be cheap and must not
/// block, or they will stall the scan.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: ScanProgress);
}

/// Sink delivering snapshots over an mpsc channel
pub struct ChannelProgress {
    tx: Mutex<Sender<ScanProgress>>,
}

impl ChannelProgress {
    /// Creates the sink and the receiving end
    pub fn new() -> (Self, Receiver<ScanProgress>) {
        let (tx, rx) = mpsc::channel();
        (ChannelProgress { tx: Mutex::new(tx) }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, progress: ScanProgress) {
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        // A dropped receiver just means nobody is listening anymore
        let _ = tx.send(progress);
    }
}

/// Pollable sink exposing the latest snapshot through atomics
#[derive(Debug, Default)]
pub struct SharedProgress {
    done: AtomicUsize,
    total: AtomicUsize,
    matches: AtomicUsize,
}

impl SharedProgress {
    /// Creates a zeroed shared progress cell
    pub fn new() -> Self {
        SharedProgress::default()
    }

    /// Reads the most recent snapshot
    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            done: self.done.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
        }
    }
}

impl ProgressSink for SharedProgress {
    fn report(&self, progress: ScanProgress) {
        self.done.store(progress.done, Ordering::Relaxed);
        self.total.store(progress.total, Ordering::Relaxed);
        self.matches.store(progress.matches, Ordering::Relaxed);
    }
}
