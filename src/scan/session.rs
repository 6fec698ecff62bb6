//! Caller-owned scan sessions
//!
//! A session owns the result store produced by its first scan and is the
//! unit of refinement: next scans shrink its store in place. Sessions are
//! independent; several may scan the same accessor concurrently.

use crate::core::types::{ScanError, ScanResult, ScanValueType};
use crate::scan::store::ResultStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle state of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// No scan has run yet
    Idle,
    /// A scan is in flight
    Scanning,
    /// The last scan finished normally
    Completed,
    /// The last scan was cancelled; the store is incomplete
    Cancelled,
    /// The last first scan hit a process-level read error
    Failed,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanState::Idle => "Idle",
            ScanState::Scanning => "Scanning",
            ScanState::Completed => "Completed",
            ScanState::Cancelled => "Cancelled",
            ScanState::Failed => "Failed",
        };
        write!(f, "{name}")
    }
}

/// Shared cooperative-cancellation flag.
///
/// Clones observe the same flag. Workers check it at chunk and region
/// boundaries, so cancellation latency is bounded by one in-flight chunk.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates an uncancelled token
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Requests cancellation of the scan holding this token
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Checks whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// A scan session: explicit, caller-owned scan state.
///
/// Created idle, populated by a first scan, refined by next scans. A
/// session whose state is `Cancelled` or `Failed` must be re-seeded with a
/// new first scan before it can refine again.
#[derive(Debug)]
pub struct ScanSession {
    state: ScanState,
    store: Option<ResultStore>,
    value_type: Option<ScanValueType>,
    pass: u32,
    cancel: CancelToken,
}

impl ScanSession {
    /// Creates an idle session
    pub fn new() -> Self {
        ScanSession {
            state: ScanState::Idle,
            store: None,
            value_type: None,
            pass: 0,
            cancel: CancelToken::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Number of completed passes (1 after a first scan)
    pub fn pass(&self) -> u32 {
        self.pass
    }

    /// Value type locked in by the first scan
    pub fn value_type(&self) -> Option<ScanValueType> {
        self.value_type
    }

    /// The current result store, if a scan has produced one
    pub fn store(&self) -> Option<&ResultStore> {
        self.store.as_ref()
    }

    /// Number of matches in the current store
    pub fn match_count(&self) -> usize {
        self.store.as_ref().map_or(0, |s| s.len())
    }

    /// A token that cancels this session's in-flight scan
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Checks whether the session can be the basis of a next scan
    pub fn is_refinable(&self) -> bool {
        self.state == ScanState::Completed && self.store.is_some()
    }

    pub(crate) fn begin_first_scan(&mut self) {
        self.state = ScanState::Scanning;
        self.cancel.reset();
    }

    /// Validates refinability and detaches the store for refinement
    pub(crate) fn begin_next_scan(
        &mut self,
        value_type: ScanValueType,
    ) -> ScanResult<ResultStore> {
        if self.state != ScanState::Completed {
            return Err(ScanError::SessionNotUsable(format!(
                "state is {}; only a Completed session can be refined",
                self.state
            )));
        }
        if self.value_type != Some(value_type) {
            return Err(ScanError::invalid(format!(
                "next scan value type {} does not match the session's {}",
                value_type,
                self.value_type.map_or("unset".to_string(), |t| t.to_string())
            )));
        }
        let Some(store) = self.store.take() else {
            return Err(ScanError::SessionNotUsable(
                "session has no result store".to_string(),
            ));
        };

        self.state = ScanState::Scanning;
        self.cancel.reset();
        Ok(store)
    }

    pub(crate) fn install_first(
        &mut self,
        store: ResultStore,
        state: ScanState,
        value_type: ScanValueType,
    ) {
        self.store = Some(store);
        self.value_type = Some(value_type);
        self.pass = 1;
        self.state = state;
    }

    pub(crate) fn install_next(&mut self, store: ResultStore, state: ScanState) {
        self.store = Some(store);
        self.pass += 1;
        self.state = state;
    }

    pub(crate) fn fail(&mut self) {
        self.store = None;
        self.state = ScanState::Failed;
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        ScanSession::new()
    }
}
