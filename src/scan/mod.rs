//! The scanning engine: settings, comparers, sessions, and result stores
//!
//! A scan session is seeded by a first scan over the target's readable
//! regions, then refined by next scans that re-read only the surviving
//! matches:
//! - [`ScanSettings`] describes one pass and is validated up front
//! - [`FirstScanComparer`]/[`NextScanComparer`] are compiled once per pass
//! - [`ScanEngine`] drives the worker pool and owns no scan state
//! - [`ScanSession`] owns the [`ResultStore`] and the cancellation token

pub mod comparer;
pub mod engine;
pub mod progress;
pub mod session;
pub mod settings;
pub mod store;

pub use comparer::{BytePattern, FirstScanComparer, NextScanComparer, TextEncoding, TextNeedle};
pub use engine::{ScanEngine, ScanSummary};
pub use progress::{ChannelProgress, ProgressSink, ScanProgress, SharedProgress};
pub use session::{CancelToken, ScanSession, ScanState};
pub use settings::{ScanComparison, ScanMode, ScanOperand, ScanSettings};
pub use store::{MatchIter, ResultStore, ScanMatch};
