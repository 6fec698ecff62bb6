//! Scan settings and pre-scan validation
//!
//! A `ScanSettings` value is immutable for one scan invocation and fully
//! validated before any region is touched; validation failures have no
//! side effects on the session.

use crate::core::types::{AddressBounds, Endianness, ScanError, ScanResult, ScanValue, ScanValueType};
use crate::memory::regions::RegionFilter;
use crate::scan::comparer::{BytePattern, TextNeedle};
use serde::{Deserialize, Serialize};

/// Whether a scan sweeps the address space or refines an existing set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Initial pass over the full configured address range
    First,
    /// Subsequent pass re-evaluating only the current result set
    Next,
}

/// The comparison a scan applies at each candidate.
///
/// Operators that need a previous value are only valid on next scans;
/// all others are only valid on first scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanComparison {
    Exact,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    /// Matches every candidate; used to seed a session with all addresses
    Unknown,
    Changed,
    Unchanged,
    Increased,
    Decreased,
    ChangedBy,
}

impl ScanComparison {
    /// Checks if this comparison needs the value from the preceding pass
    pub fn requires_previous(&self) -> bool {
        matches!(
            self,
            ScanComparison::Changed
                | ScanComparison::Unchanged
                | ScanComparison::Increased
                | ScanComparison::Decreased
                | ScanComparison::ChangedBy
        )
    }

    /// Checks if this comparison needs an operand
    pub fn requires_operand(&self) -> bool {
        matches!(
            self,
            ScanComparison::Exact
                | ScanComparison::NotEqual
                | ScanComparison::GreaterThan
                | ScanComparison::GreaterThanOrEqual
                | ScanComparison::LessThan
                | ScanComparison::LessThanOrEqual
                | ScanComparison::Between
                | ScanComparison::ChangedBy
        )
    }

    /// Checks if this comparison is supported for the given value type
    pub fn valid_for(&self, value_type: ScanValueType) -> bool {
        if value_type.is_numeric() {
            return true;
        }
        // ArrayOfBytes and String: literal match on first scans, byte-wise
        // change detection on next scans.
        matches!(
            self,
            ScanComparison::Exact | ScanComparison::Changed | ScanComparison::Unchanged
        )
    }
}

/// Operand(s) for the configured comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOperand {
    /// No operand (Unknown, Changed, Unchanged, Increased, Decreased)
    None,
    /// Single value operand, including the ChangedBy delta
    Value(ScanValue),
    /// Inclusive Between range
    Range { low: ScanValue, high: ScanValue },
    /// Byte pattern with wildcards
    Pattern(BytePattern),
    /// String needle with encoding and case flag
    Text(TextNeedle),
}

/// Immutable parameters for one scan invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    pub value_type: ScanValueType,
    pub mode: ScanMode,
    pub comparison: ScanComparison,
    pub operand: ScanOperand,
    /// Required stride between candidate addresses, in bytes
    pub alignment: u64,
    pub bounds: AddressBounds,
    /// Protection criteria regions must satisfy on a first scan
    pub region_filter: RegionFilter,
    pub endianness: Endianness,
    /// Absolute tolerance for Float/Double equality; 0 means exact bit compare
    pub float_tolerance: f64,
    /// Worker pool size override; `None` uses the engine configuration
    pub worker_threads: Option<usize>,
    /// Stop early once this many matches were found and flag the store truncated
    pub max_results: Option<usize>,
}

impl ScanSettings {
    fn new(
        value_type: ScanValueType,
        mode: ScanMode,
        comparison: ScanComparison,
        operand: ScanOperand,
    ) -> Self {
        ScanSettings {
            value_type,
            mode,
            comparison,
            operand,
            alignment: value_type.natural_alignment(),
            bounds: AddressBounds::everything(),
            region_filter: RegionFilter::new(),
            endianness: Endianness::default(),
            float_tolerance: 0.0,
            worker_threads: None,
            max_results: None,
        }
    }

    /// Settings for a first scan; alignment defaults to the type's width
    pub fn first_scan(
        value_type: ScanValueType,
        comparison: ScanComparison,
        operand: ScanOperand,
    ) -> Self {
        ScanSettings::new(value_type, ScanMode::First, comparison, operand)
    }

    /// Settings for a next scan over an existing session
    pub fn next_scan(
        value_type: ScanValueType,
        comparison: ScanComparison,
        operand: ScanOperand,
    ) -> Self {
        ScanSettings::new(value_type, ScanMode::Next, comparison, operand)
    }

    /// Set the candidate address stride
    pub fn with_alignment(mut self, alignment: u64) -> Self {
        self.alignment = alignment;
        self
    }

    /// Restrict the scan to an address range
    pub fn with_bounds(mut self, bounds: AddressBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Restrict the first-scan sweep to regions matching the filter
    pub fn with_region_filter(mut self, filter: RegionFilter) -> Self {
        self.region_filter = filter;
        self
    }

    /// Set the byte order used to decode numeric values
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Set the Float/Double equality tolerance
    pub fn with_float_tolerance(mut self, tolerance: f64) -> Self {
        self.float_tolerance = tolerance;
        self
    }

    /// Override the worker pool size for this scan
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Cap the number of matches collected
    pub fn with_max_results(mut self, cap: usize) -> Self {
        self.max_results = Some(cap);
        self
    }

    /// Validates the settings; rejected settings never start a scan
    pub fn validate(&self) -> ScanResult<()> {
        if self.alignment == 0 {
            return Err(ScanError::invalid("alignment must be greater than zero"));
        }

        if !self.bounds.is_valid() {
            return Err(ScanError::invalid(format!(
                "address bounds are empty or inverted: {}",
                self.bounds
            )));
        }

        if !self.float_tolerance.is_finite() || self.float_tolerance < 0.0 {
            return Err(ScanError::invalid(
                "float tolerance must be finite and non-negative",
            ));
        }
        if self.float_tolerance > 0.0 && !self.value_type.is_float() {
            return Err(ScanError::invalid(format!(
                "float tolerance does not apply to value type {}",
                self.value_type
            )));
        }

        match self.mode {
            ScanMode::First if self.comparison.requires_previous() => {
                return Err(ScanError::invalid(format!(
                    "{:?} needs a previous value and is only valid on a next scan",
                    self.comparison
                )));
            }
            ScanMode::Next if !self.comparison.requires_previous() => {
                return Err(ScanError::invalid(format!(
                    "{:?} is only valid on a first scan",
                    self.comparison
                )));
            }
            _ => {}
        }

        if !self.comparison.valid_for(self.value_type) {
            return Err(ScanError::invalid(format!(
                "{:?} is not supported for value type {}",
                self.comparison, self.value_type
            )));
        }

        if let Some(0) = self.worker_threads {
            return Err(ScanError::invalid("worker thread count must be at least 1"));
        }
        if let Some(0) = self.max_results {
            return Err(ScanError::invalid("result cap must be greater than zero"));
        }

        self.validate_operand()
    }

    fn validate_operand(&self) -> ScanResult<()> {
        if !self.comparison.requires_operand() {
            return match self.operand {
                ScanOperand::None => Ok(()),
                _ => Err(ScanError::invalid(format!(
                    "{:?} does not take an operand",
                    self.comparison
                ))),
            };
        }

        match self.value_type {
            ScanValueType::ArrayOfBytes => match &self.operand {
                ScanOperand::Pattern(pattern) if !pattern.is_empty() => Ok(()),
                ScanOperand::Pattern(_) => {
                    Err(ScanError::invalid("byte pattern must not be empty"))
                }
                _ => Err(ScanError::invalid(
                    "array-of-bytes scans take a byte pattern operand",
                )),
            },
            ScanValueType::String => match &self.operand {
                ScanOperand::Text(needle) if !needle.is_empty() => Ok(()),
                ScanOperand::Text(_) => Err(ScanError::invalid("string needle must not be empty")),
                _ => Err(ScanError::invalid("string scans take a text operand")),
            },
            numeric => match (&self.comparison, &self.operand) {
                (ScanComparison::Between, ScanOperand::Range { low, high }) => {
                    self.check_numeric_operand(numeric, low)?;
                    self.check_numeric_operand(numeric, high)?;
                    if compare_operands(low, high) == Some(std::cmp::Ordering::Greater) {
                        return Err(ScanError::invalid(
                            "Between range is inverted: low is greater than high",
                        ));
                    }
                    Ok(())
                }
                (ScanComparison::Between, _) => {
                    Err(ScanError::invalid("Between takes a low/high range operand"))
                }
                (_, ScanOperand::Value(value)) => self.check_numeric_operand(numeric, value),
                _ => Err(ScanError::invalid(format!(
                    "{:?} takes a single value operand",
                    self.comparison
                ))),
            },
        }
    }

    fn check_numeric_operand(&self, expected: ScanValueType, value: &ScanValue) -> ScanResult<()> {
        if value.value_type() != expected {
            return Err(ScanError::invalid(format!(
                "operand type {} does not match scan value type {}",
                value.value_type(),
                expected
            )));
        }
        let nan = match value {
            ScanValue::Float(v) => v.is_nan(),
            ScanValue::Double(v) => v.is_nan(),
            _ => false,
        };
        if nan {
            return Err(ScanError::invalid("operand must not be NaN"));
        }
        Ok(())
    }
}

fn compare_operands(low: &ScanValue, high: &ScanValue) -> Option<std::cmp::Ordering> {
    match (low, high) {
        (ScanValue::Byte(a), ScanValue::Byte(b)) => a.partial_cmp(b),
        (ScanValue::Short(a), ScanValue::Short(b)) => a.partial_cmp(b),
        (ScanValue::Integer(a), ScanValue::Integer(b)) => a.partial_cmp(b),
        (ScanValue::Long(a), ScanValue::Long(b)) => a.partial_cmp(b),
        (ScanValue::Float(a), ScanValue::Float(b)) => a.partial_cmp(b),
        (ScanValue::Double(a), ScanValue::Double(b)) => a.partial_cmp(b),
        _ => None,
    }
}
