//! Result store: the current set of matching addresses and their values
//!
//! Matches are held as fixed-width packed records (address, current bytes,
//! previous bytes) rather than materialized structs. A store whose match
//! count crosses the configured spill threshold pages its records to an
//! anonymous temporary file, so an initial Unknown scan with millions of
//! matches does not keep every match resident; iteration streams records
//! back in either case.

use crate::core::types::{Address, Endianness, ScanResult, ScanValue, ScanValueType};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use tempfile::{NamedTempFile, TempPath};
use tracing::debug;

/// A single matching address with its observed values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanMatch {
    pub address: Address,
    /// Value observed during the pass that produced this store
    pub value: ScanValue,
    /// Value recorded at the end of the immediately preceding pass;
    /// `None` after a first scan
    pub previous: Option<ScanValue>,
}

/// Packed record as the engine sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawRecord {
    pub address: u64,
    pub current: Vec<u8>,
    pub previous: Vec<u8>,
}

enum Backing {
    Memory(Vec<u8>),
    Spilled(TempPath),
}

impl std::fmt::Debug for Backing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backing::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            Backing::Spilled(path) => write!(f, "Spilled({})", path.display()),
        }
    }
}

/// The match set produced by a scan pass.
///
/// Created by a first scan, replaced wholesale by the next first scan, and
/// shrunk monotonically by next scans: refinement only ever removes
/// addresses, never adds them.
#[derive(Debug)]
pub struct ResultStore {
    value_type: ScanValueType,
    value_width: usize,
    endianness: Endianness,
    count: usize,
    has_previous: bool,
    truncated: bool,
    complete: bool,
    backing: Backing,
}

impl ResultStore {
    /// Number of matches in the store
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if the store holds no matches
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Value type the store's records decode as
    pub fn value_type(&self) -> ScanValueType {
        self.value_type
    }

    /// Byte width of one value slot in a record
    pub fn value_width(&self) -> usize {
        self.value_width
    }

    /// Byte order used to decode record values
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// True when the scan stopped early at the result cap
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// False when the producing scan was cancelled mid-pass
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// True once at least one next scan recorded previous values
    pub fn has_previous(&self) -> bool {
        self.has_previous
    }

    /// True when records have been paged out to a spill file
    pub fn is_spilled(&self) -> bool {
        matches!(self.backing, Backing::Spilled(_))
    }

    /// Lazily iterates the matches, decoding values on the fly.
    ///
    /// The iteration is restartable: every call starts a fresh pass over
    /// the records.
    pub fn iter(&self) -> ScanResult<MatchIter<'_>> {
        Ok(MatchIter {
            store: self,
            records: self.raw_iter()?,
        })
    }

    pub(crate) fn raw_iter(&self) -> ScanResult<RecordIter<'_>> {
        let source = match &self.backing {
            Backing::Memory(bytes) => RecordSource::Memory { bytes, offset: 0 },
            Backing::Spilled(path) => RecordSource::File(BufReader::new(File::open(path)?)),
        };
        Ok(RecordIter {
            source,
            remaining: self.count,
            value_width: self.value_width,
        })
    }
}

enum RecordSource<'a> {
    Memory { bytes: &'a [u8], offset: usize },
    File(BufReader<File>),
}

/// Streams packed records back out of a store
pub(crate) struct RecordIter<'a> {
    source: RecordSource<'a>,
    remaining: usize,
    value_width: usize,
}

impl RecordIter<'_> {
    fn read_record(&mut self) -> ScanResult<RawRecord> {
        let width = self.value_width;
        match &mut self.source {
            RecordSource::Memory { bytes, offset } => {
                let record = &bytes[*offset..*offset + 8 + 2 * width];
                *offset += 8 + 2 * width;
                let mut addr = [0u8; 8];
                addr.copy_from_slice(&record[..8]);
                Ok(RawRecord {
                    address: u64::from_le_bytes(addr),
                    current: record[8..8 + width].to_vec(),
                    previous: record[8 + width..].to_vec(),
                })
            }
            RecordSource::File(reader) => {
                let mut addr = [0u8; 8];
                reader.read_exact(&mut addr)?;
                let mut current = vec![0u8; width];
                reader.read_exact(&mut current)?;
                let mut previous = vec![0u8; width];
                reader.read_exact(&mut previous)?;
                Ok(RawRecord {
                    address: u64::from_le_bytes(addr),
                    current,
                    previous,
                })
            }
        }
    }
}

impl Iterator for RecordIter<'_> {
    type Item = ScanResult<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        match self.read_record() {
            Ok(record) => Some(Ok(record)),
            Err(e) => {
                // A short spill file ends the iteration after the error
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

/// Lazily decodes matches from a store
pub struct MatchIter<'a> {
    store: &'a ResultStore,
    records: RecordIter<'a>,
}

impl Iterator for MatchIter<'_> {
    type Item = ScanResult<ScanMatch>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };

        let value_type = self.store.value_type;
        let endianness = self.store.endianness;
        let value = decode_value(&record.current, value_type, endianness);
        let previous = if self.store.has_previous {
            Some(decode_value(&record.previous, value_type, endianness))
        } else {
            None
        };

        Some(Ok(ScanMatch {
            address: Address::new(record.address),
            value,
            previous,
        }))
    }
}

fn decode_value(bytes: &[u8], value_type: ScanValueType, endianness: Endianness) -> ScanValue {
    ScanValue::from_bytes_lossy(bytes, value_type, endianness)
        .unwrap_or_else(|| ScanValue::Bytes(bytes.to_vec()))
}

/// Accumulates records for a store under construction
pub(crate) struct StoreBuilder {
    value_type: ScanValueType,
    value_width: usize,
    endianness: Endianness,
    spill_threshold: usize,
    count: usize,
    buffer: Vec<u8>,
    file: Option<BufWriter<NamedTempFile>>,
}

impl StoreBuilder {
    pub(crate) fn new(
        value_type: ScanValueType,
        value_width: usize,
        endianness: Endianness,
        spill_threshold: usize,
    ) -> Self {
        StoreBuilder {
            value_type,
            value_width,
            endianness,
            spill_threshold,
            count: 0,
            buffer: Vec::new(),
            file: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    /// Appends one record; `current` and `previous` must be `value_width` bytes
    pub(crate) fn push(&mut self, address: u64, current: &[u8], previous: &[u8]) -> ScanResult<()> {
        debug_assert_eq!(current.len(), self.value_width);
        debug_assert_eq!(previous.len(), self.value_width);

        if self.file.is_none() && self.count >= self.spill_threshold {
            self.spill()?;
        }

        if let Some(writer) = &mut self.file {
            writer.write_all(&address.to_le_bytes())?;
            writer.write_all(current)?;
            writer.write_all(previous)?;
        } else {
            self.buffer.extend_from_slice(&address.to_le_bytes());
            self.buffer.extend_from_slice(current);
            self.buffer.extend_from_slice(previous);
        }
        self.count += 1;
        Ok(())
    }

    fn spill(&mut self) -> ScanResult<()> {
        debug!(records = self.count, "spilling result store to disk");
        let mut writer = BufWriter::new(NamedTempFile::new()?);
        writer.write_all(&self.buffer)?;
        self.buffer = Vec::new();
        self.file = Some(writer);
        Ok(())
    }

    pub(crate) fn finish(
        self,
        has_previous: bool,
        truncated: bool,
        complete: bool,
    ) -> ScanResult<ResultStore> {
        let backing = match self.file {
            Some(writer) => {
                let tempfile = writer.into_inner().map_err(|e| e.into_error())?;
                let (_, path) = tempfile.into_parts();
                Backing::Spilled(path)
            }
            None => Backing::Memory(self.buffer),
        };

        Ok(ResultStore {
            value_type: self.value_type,
            value_width: self.value_width,
            endianness: self.endianness,
            count: self.count,
            has_previous,
            truncated,
            complete,
            backing,
        })
    }
}
