//! Compiled scan comparers
//!
//! Comparers are pure functions of the bytes they are given and carry no
//! mutable state. The comparer set is closed: one variant per value type,
//! selected once from validated settings, so the per-candidate loop runs
//! without any dynamic dispatch.
//!
//! NaN never satisfies any comparison, including `Unchanged` and `Unknown`.
//! Float equality is an exact bit compare unless a tolerance is configured.

use crate::core::types::{Endianness, ScanError, ScanResult, ScanValue, ScanValueType};
use crate::scan::settings::{ScanComparison, ScanOperand, ScanSettings};
use serde::{Deserialize, Serialize};
use std::fmt;

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width value decodable from scanned bytes
pub trait Scalar: Copy + PartialEq + PartialOrd + sealed::Sealed {
    const WIDTH: usize;

    /// Decodes from `bytes`, which must hold at least `WIDTH` bytes
    fn decode(bytes: &[u8], endianness: Endianness) -> Self;
}

macro_rules! impl_scalar {
    ($($ty:ty => $width:expr),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl Scalar for $ty {
            const WIDTH: usize = $width;

            #[inline(always)]
            fn decode(bytes: &[u8], endianness: Endianness) -> Self {
                let mut arr = [0u8; $width];
                arr.copy_from_slice(&bytes[..$width]);
                match endianness {
                    Endianness::Little => <$ty>::from_le_bytes(arr),
                    Endianness::Big => <$ty>::from_be_bytes(arr),
                }
            }
        }
    )*};
}

impl_scalar!(u8 => 1, i16 => 2, i32 => 4, i64 => 8, f32 => 4, f64 => 8);

/// Integer scalar with wrapping arithmetic for delta comparisons
pub trait IntScalar: Scalar {
    fn wrapping_add(self, rhs: Self) -> Self;
}

macro_rules! impl_int_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl IntScalar for $ty {
            #[inline(always)]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$ty>::wrapping_add(self, rhs)
            }
        }
    )*};
}

impl_int_scalar!(u8, i16, i32, i64);

/// Float scalar with NaN and bit-equality queries
pub trait FloatScalar: Scalar {
    fn is_nan(self) -> bool;
    fn as_f64(self) -> f64;
    fn bits_eq(self, other: Self) -> bool;
}

impl FloatScalar for f32 {
    #[inline(always)]
    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }

    #[inline(always)]
    fn as_f64(self) -> f64 {
        self as f64
    }

    #[inline(always)]
    fn bits_eq(self, other: Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl FloatScalar for f64 {
    #[inline(always)]
    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }

    #[inline(always)]
    fn as_f64(self) -> f64 {
        self
    }

    #[inline(always)]
    fn bits_eq(self, other: Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

/// Byte pattern with wildcard positions (`None` = wildcard)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytePattern {
    bytes: Vec<Option<u8>>,
}

impl BytePattern {
    /// Builds a pattern from explicit literal/wildcard positions
    pub fn new(bytes: Vec<Option<u8>>) -> Self {
        BytePattern { bytes }
    }

    /// Parses hex text with `??` wildcards, e.g. `"48 8B ?? ?? 89"`
    pub fn from_hex_str(pattern: &str) -> ScanResult<Self> {
        let mut bytes = Vec::new();

        for part in pattern.split_whitespace() {
            if part == "??" || part == "?" {
                bytes.push(None);
                continue;
            }
            if part.len() != 2 {
                return Err(ScanError::invalid(format!(
                    "invalid pattern byte '{part}': must be 2 hex digits or ??"
                )));
            }
            let byte = u8::from_str_radix(part, 16)
                .map_err(|_| ScanError::invalid(format!("invalid hex in pattern: {part}")))?;
            bytes.push(Some(byte));
        }

        if bytes.is_empty() {
            return Err(ScanError::invalid("byte pattern must not be empty"));
        }

        Ok(BytePattern { bytes })
    }

    /// Pattern length in bytes, wildcards included
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the pattern has no positions at all
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Checks a window of exactly `len()` bytes against the pattern
    #[inline]
    pub fn matches(&self, window: &[u8]) -> bool {
        if window.len() < self.bytes.len() {
            return false;
        }
        self.bytes
            .iter()
            .zip(window)
            .all(|(p, b)| p.map_or(true, |literal| literal == *b))
    }
}

impl fmt::Display for BytePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .bytes
            .iter()
            .map(|b| match b {
                Some(v) => hex::encode_upper([*v]),
                None => "??".to_string(),
            })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Text encoding for string scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    Utf8,
    /// UTF-16 little-endian, two bytes per code unit
    Utf16,
}

/// String operand for a text scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNeedle {
    text: String,
    encoding: TextEncoding,
    case_sensitive: bool,
}

impl TextNeedle {
    /// Creates a case-sensitive needle
    pub fn new(text: impl Into<String>, encoding: TextEncoding) -> Self {
        TextNeedle {
            text: text.into(),
            encoding,
            case_sensitive: true,
        }
    }

    /// Makes the comparison case-insensitive (ASCII folding only)
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    /// Check if the needle text is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The needle encoded in its declared encoding, without a terminator
    pub fn encoded(&self) -> Vec<u8> {
        match self.encoding {
            TextEncoding::Utf8 => self.text.as_bytes().to_vec(),
            TextEncoding::Utf16 => self
                .text
                .encode_utf16()
                .flat_map(|unit| unit.to_le_bytes())
                .collect(),
        }
    }

    /// Width of the scanned window, in bytes
    pub fn width(&self) -> usize {
        match self.encoding {
            TextEncoding::Utf8 => self.text.len(),
            TextEncoding::Utf16 => self.text.encode_utf16().count() * 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumericOp {
    Exact,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Between,
    Unknown,
}

impl NumericOp {
    fn from_comparison(comparison: ScanComparison) -> ScanResult<Self> {
        Ok(match comparison {
            ScanComparison::Exact => NumericOp::Exact,
            ScanComparison::NotEqual => NumericOp::NotEqual,
            ScanComparison::GreaterThan => NumericOp::Greater,
            ScanComparison::GreaterThanOrEqual => NumericOp::GreaterOrEqual,
            ScanComparison::LessThan => NumericOp::Less,
            ScanComparison::LessThanOrEqual => NumericOp::LessOrEqual,
            ScanComparison::Between => NumericOp::Between,
            ScanComparison::Unknown => NumericOp::Unknown,
            other => {
                return Err(ScanError::invalid(format!(
                    "{other:?} is not a first-scan comparison"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeltaOp {
    Changed,
    Unchanged,
    Increased,
    Decreased,
    ChangedBy,
}

impl DeltaOp {
    fn from_comparison(comparison: ScanComparison) -> ScanResult<Self> {
        Ok(match comparison {
            ScanComparison::Changed => DeltaOp::Changed,
            ScanComparison::Unchanged => DeltaOp::Unchanged,
            ScanComparison::Increased => DeltaOp::Increased,
            ScanComparison::Decreased => DeltaOp::Decreased,
            ScanComparison::ChangedBy => DeltaOp::ChangedBy,
            other => {
                return Err(ScanError::invalid(format!(
                    "{other:?} is not a next-scan comparison"
                )))
            }
        })
    }
}

/// First-scan test for an integer type
#[derive(Debug, Clone)]
pub struct IntFirst<T> {
    op: NumericOp,
    low: T,
    high: T,
    endianness: Endianness,
}

impl<T: Scalar> IntFirst<T> {
    #[inline]
    fn test(&self, window: &[u8]) -> bool {
        let v = T::decode(window, self.endianness);
        match self.op {
            NumericOp::Exact => v == self.low,
            NumericOp::NotEqual => v != self.low,
            NumericOp::Greater => v > self.low,
            NumericOp::GreaterOrEqual => v >= self.low,
            NumericOp::Less => v < self.low,
            NumericOp::LessOrEqual => v <= self.low,
            NumericOp::Between => v >= self.low && v <= self.high,
            NumericOp::Unknown => true,
        }
    }
}

/// First-scan test for a float type
#[derive(Debug, Clone)]
pub struct FloatFirst<T> {
    op: NumericOp,
    low: T,
    high: T,
    tolerance: f64,
    endianness: Endianness,
}

impl<T: FloatScalar> FloatFirst<T> {
    #[inline]
    fn test(&self, window: &[u8]) -> bool {
        let v = T::decode(window, self.endianness);
        if v.is_nan() {
            return false;
        }
        match self.op {
            NumericOp::Exact => {
                if self.tolerance == 0.0 {
                    v.bits_eq(self.low)
                } else {
                    (v.as_f64() - self.low.as_f64()).abs() <= self.tolerance
                }
            }
            NumericOp::NotEqual => {
                if self.tolerance == 0.0 {
                    !v.bits_eq(self.low)
                } else {
                    (v.as_f64() - self.low.as_f64()).abs() > self.tolerance
                }
            }
            NumericOp::Greater => v > self.low,
            NumericOp::GreaterOrEqual => v >= self.low,
            NumericOp::Less => v < self.low,
            NumericOp::LessOrEqual => v <= self.low,
            NumericOp::Between => v >= self.low && v <= self.high,
            NumericOp::Unknown => true,
        }
    }
}

/// First-scan test for a byte pattern
#[derive(Debug, Clone)]
pub struct PatternFirst {
    pattern: BytePattern,
}

/// First-scan test for a text needle
#[derive(Debug, Clone)]
pub struct TextFirst {
    needle: Vec<u8>,
    encoding: TextEncoding,
    case_sensitive: bool,
}

impl TextFirst {
    #[inline]
    fn test(&self, window: &[u8]) -> bool {
        if window.len() < self.needle.len() {
            return false;
        }
        let window = &window[..self.needle.len()];
        if self.case_sensitive {
            return window == self.needle.as_slice();
        }
        match self.encoding {
            TextEncoding::Utf8 => window.eq_ignore_ascii_case(&self.needle),
            TextEncoding::Utf16 => utf16_eq_ignore_ascii_case(window, &self.needle),
        }
    }
}

// Compares UTF-16LE byte streams unit by unit, folding only ASCII letters.
fn utf16_eq_ignore_ascii_case(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() || a.len() % 2 != 0 {
        return false;
    }
    a.chunks_exact(2).zip(b.chunks_exact(2)).all(|(ua, ub)| {
        if ua[1] != ub[1] {
            return false;
        }
        if ua[1] == 0 {
            ua[0].eq_ignore_ascii_case(&ub[0])
        } else {
            ua[0] == ub[0]
        }
    })
}

/// Compiled first-scan comparer, one variant per value type
#[derive(Debug, Clone)]
pub enum FirstScanComparer {
    Byte(IntFirst<u8>),
    Short(IntFirst<i16>),
    Integer(IntFirst<i32>),
    Long(IntFirst<i64>),
    Float(FloatFirst<f32>),
    Double(FloatFirst<f64>),
    Pattern(PatternFirst),
    Text(TextFirst),
}

impl FirstScanComparer {
    /// Selects the comparison function for validated first-scan settings
    pub fn compile(settings: &ScanSettings) -> ScanResult<Self> {
        let op = NumericOp::from_comparison(settings.comparison);
        let endianness = settings.endianness;

        Ok(match settings.value_type {
            ScanValueType::Byte => {
                let (low, high) = first_operands(settings, |v| match v {
                    ScanValue::Byte(x) => Some(*x),
                    _ => None,
                })?;
                FirstScanComparer::Byte(IntFirst { op: op?, low, high, endianness })
            }
            ScanValueType::Short => {
                let (low, high) = first_operands(settings, |v| match v {
                    ScanValue::Short(x) => Some(*x),
                    _ => None,
                })?;
                FirstScanComparer::Short(IntFirst { op: op?, low, high, endianness })
            }
            ScanValueType::Integer => {
                let (low, high) = first_operands(settings, |v| match v {
                    ScanValue::Integer(x) => Some(*x),
                    _ => None,
                })?;
                FirstScanComparer::Integer(IntFirst { op: op?, low, high, endianness })
            }
            ScanValueType::Long => {
                let (low, high) = first_operands(settings, |v| match v {
                    ScanValue::Long(x) => Some(*x),
                    _ => None,
                })?;
                FirstScanComparer::Long(IntFirst { op: op?, low, high, endianness })
            }
            ScanValueType::Float => {
                let (low, high) = first_operands(settings, |v| match v {
                    ScanValue::Float(x) => Some(*x),
                    _ => None,
                })?;
                FirstScanComparer::Float(FloatFirst {
                    op: op?,
                    low,
                    high,
                    tolerance: settings.float_tolerance,
                    endianness,
                })
            }
            ScanValueType::Double => {
                let (low, high) = first_operands(settings, |v| match v {
                    ScanValue::Double(x) => Some(*x),
                    _ => None,
                })?;
                FirstScanComparer::Double(FloatFirst {
                    op: op?,
                    low,
                    high,
                    tolerance: settings.float_tolerance,
                    endianness,
                })
            }
            ScanValueType::ArrayOfBytes => {
                if settings.comparison != ScanComparison::Exact {
                    return Err(ScanError::invalid(
                        "array-of-bytes first scans only support Exact",
                    ));
                }
                match &settings.operand {
                    ScanOperand::Pattern(pattern) => FirstScanComparer::Pattern(PatternFirst {
                        pattern: pattern.clone(),
                    }),
                    _ => {
                        return Err(ScanError::invalid(
                            "array-of-bytes scans take a byte pattern operand",
                        ))
                    }
                }
            }
            ScanValueType::String => {
                if settings.comparison != ScanComparison::Exact {
                    return Err(ScanError::invalid("string first scans only support Exact"));
                }
                match &settings.operand {
                    ScanOperand::Text(needle) => FirstScanComparer::Text(TextFirst {
                        needle: needle.encoded(),
                        encoding: needle.encoding,
                        case_sensitive: needle.case_sensitive,
                    }),
                    _ => return Err(ScanError::invalid("string scans take a text operand")),
                }
            }
        })
    }

    /// Width of the byte window this comparer inspects
    pub fn width(&self) -> usize {
        match self {
            FirstScanComparer::Byte(_) => 1,
            FirstScanComparer::Short(_) => 2,
            FirstScanComparer::Integer(_) | FirstScanComparer::Float(_) => 4,
            FirstScanComparer::Long(_) | FirstScanComparer::Double(_) => 8,
            FirstScanComparer::Pattern(p) => p.pattern.len(),
            FirstScanComparer::Text(t) => t.needle.len(),
        }
    }

    /// Tests a window of exactly `width()` bytes
    #[inline]
    pub fn test(&self, window: &[u8]) -> bool {
        match self {
            FirstScanComparer::Byte(c) => c.test(window),
            FirstScanComparer::Short(c) => c.test(window),
            FirstScanComparer::Integer(c) => c.test(window),
            FirstScanComparer::Long(c) => c.test(window),
            FirstScanComparer::Float(c) => c.test(window),
            FirstScanComparer::Double(c) => c.test(window),
            FirstScanComparer::Pattern(c) => c.pattern.matches(window),
            FirstScanComparer::Text(c) => c.test(window),
        }
    }
}

/// Next-scan test for an integer type
#[derive(Debug, Clone)]
pub struct IntNext<T> {
    op: DeltaOp,
    delta: T,
    endianness: Endianness,
}

impl<T: IntScalar> IntNext<T> {
    #[inline]
    fn test(&self, current: &[u8], previous: &[u8]) -> bool {
        let c = T::decode(current, self.endianness);
        let p = T::decode(previous, self.endianness);
        match self.op {
            DeltaOp::Changed => c != p,
            DeltaOp::Unchanged => c == p,
            DeltaOp::Increased => c > p,
            DeltaOp::Decreased => c < p,
            DeltaOp::ChangedBy => c == p.wrapping_add(self.delta),
        }
    }
}

/// Next-scan test for a float type
#[derive(Debug, Clone)]
pub struct FloatNext<T> {
    op: DeltaOp,
    delta: T,
    tolerance: f64,
    endianness: Endianness,
}

impl<T: FloatScalar> FloatNext<T> {
    #[inline]
    fn test(&self, current: &[u8], previous: &[u8]) -> bool {
        let c = T::decode(current, self.endianness);
        let p = T::decode(previous, self.endianness);
        if c.is_nan() || p.is_nan() {
            return false;
        }
        match self.op {
            DeltaOp::Changed => {
                if self.tolerance == 0.0 {
                    !c.bits_eq(p)
                } else {
                    (c.as_f64() - p.as_f64()).abs() > self.tolerance
                }
            }
            DeltaOp::Unchanged => {
                if self.tolerance == 0.0 {
                    c.bits_eq(p)
                } else {
                    (c.as_f64() - p.as_f64()).abs() <= self.tolerance
                }
            }
            DeltaOp::Increased => c > p,
            DeltaOp::Decreased => c < p,
            DeltaOp::ChangedBy => {
                let diff = c.as_f64() - p.as_f64();
                if self.tolerance == 0.0 {
                    diff == self.delta.as_f64()
                } else {
                    (diff - self.delta.as_f64()).abs() <= self.tolerance
                }
            }
        }
    }
}

/// Byte-wise next-scan test for patterns and strings
#[derive(Debug, Clone)]
pub struct BytesNext {
    unchanged: bool,
}

impl BytesNext {
    #[inline]
    fn test(&self, current: &[u8], previous: &[u8]) -> bool {
        (current == previous) == self.unchanged
    }
}

/// Compiled next-scan comparer, one variant per value type
#[derive(Debug, Clone)]
pub enum NextScanComparer {
    Byte(IntNext<u8>),
    Short(IntNext<i16>),
    Integer(IntNext<i32>),
    Long(IntNext<i64>),
    Float(FloatNext<f32>),
    Double(FloatNext<f64>),
    Bytes(BytesNext),
}

impl NextScanComparer {
    /// Selects the comparison function for validated next-scan settings
    pub fn compile(settings: &ScanSettings) -> ScanResult<Self> {
        let op = DeltaOp::from_comparison(settings.comparison)?;
        let endianness = settings.endianness;

        Ok(match settings.value_type {
            ScanValueType::Byte => {
                let delta = delta_operand(settings, op, |v| match v {
                    ScanValue::Byte(x) => Some(*x),
                    _ => None,
                })?;
                NextScanComparer::Byte(IntNext { op, delta, endianness })
            }
            ScanValueType::Short => {
                let delta = delta_operand(settings, op, |v| match v {
                    ScanValue::Short(x) => Some(*x),
                    _ => None,
                })?;
                NextScanComparer::Short(IntNext { op, delta, endianness })
            }
            ScanValueType::Integer => {
                let delta = delta_operand(settings, op, |v| match v {
                    ScanValue::Integer(x) => Some(*x),
                    _ => None,
                })?;
                NextScanComparer::Integer(IntNext { op, delta, endianness })
            }
            ScanValueType::Long => {
                let delta = delta_operand(settings, op, |v| match v {
                    ScanValue::Long(x) => Some(*x),
                    _ => None,
                })?;
                NextScanComparer::Long(IntNext { op, delta, endianness })
            }
            ScanValueType::Float => {
                let delta = delta_operand(settings, op, |v| match v {
                    ScanValue::Float(x) => Some(*x),
                    _ => None,
                })?;
                NextScanComparer::Float(FloatNext {
                    op,
                    delta,
                    tolerance: settings.float_tolerance,
                    endianness,
                })
            }
            ScanValueType::Double => {
                let delta = delta_operand(settings, op, |v| match v {
                    ScanValue::Double(x) => Some(*x),
                    _ => None,
                })?;
                NextScanComparer::Double(FloatNext {
                    op,
                    delta,
                    tolerance: settings.float_tolerance,
                    endianness,
                })
            }
            ScanValueType::ArrayOfBytes | ScanValueType::String => match op {
                DeltaOp::Changed => NextScanComparer::Bytes(BytesNext { unchanged: false }),
                DeltaOp::Unchanged => NextScanComparer::Bytes(BytesNext { unchanged: true }),
                _ => {
                    return Err(ScanError::invalid(format!(
                        "{:?} is not supported for value type {}",
                        settings.comparison, settings.value_type
                    )))
                }
            },
        })
    }

    /// Window width, or `None` for the operand-sized types (the result
    /// store's record width applies there)
    pub fn width(&self) -> Option<usize> {
        match self {
            NextScanComparer::Byte(_) => Some(1),
            NextScanComparer::Short(_) => Some(2),
            NextScanComparer::Integer(_) | NextScanComparer::Float(_) => Some(4),
            NextScanComparer::Long(_) | NextScanComparer::Double(_) => Some(8),
            NextScanComparer::Bytes(_) => None,
        }
    }

    /// Tests the current window against the previous pass's window
    #[inline]
    pub fn test(&self, current: &[u8], previous: &[u8]) -> bool {
        match self {
            NextScanComparer::Byte(c) => c.test(current, previous),
            NextScanComparer::Short(c) => c.test(current, previous),
            NextScanComparer::Integer(c) => c.test(current, previous),
            NextScanComparer::Long(c) => c.test(current, previous),
            NextScanComparer::Float(c) => c.test(current, previous),
            NextScanComparer::Double(c) => c.test(current, previous),
            NextScanComparer::Bytes(c) => c.test(current, previous),
        }
    }
}

fn first_operands<T: Scalar + Default>(
    settings: &ScanSettings,
    extract: impl Fn(&ScanValue) -> Option<T>,
) -> ScanResult<(T, T)> {
    match (&settings.comparison, &settings.operand) {
        (ScanComparison::Between, ScanOperand::Range { low, high }) => {
            let low = extract(low)
                .ok_or_else(|| ScanError::invalid("range operand type mismatch"))?;
            let high = extract(high)
                .ok_or_else(|| ScanError::invalid("range operand type mismatch"))?;
            Ok((low, high))
        }
        (ScanComparison::Between, _) => {
            Err(ScanError::invalid("Between takes a low/high range operand"))
        }
        (ScanComparison::Unknown, ScanOperand::None) => Ok((T::default(), T::default())),
        (_, ScanOperand::Value(value)) => {
            let v = extract(value).ok_or_else(|| ScanError::invalid("operand type mismatch"))?;
            Ok((v, v))
        }
        _ => Err(ScanError::invalid(format!(
            "missing or mismatched operand for {:?}",
            settings.comparison
        ))),
    }
}

fn delta_operand<T: Scalar + Default>(
    settings: &ScanSettings,
    op: DeltaOp,
    extract: impl Fn(&ScanValue) -> Option<T>,
) -> ScanResult<T> {
    match (op, &settings.operand) {
        (DeltaOp::ChangedBy, ScanOperand::Value(value)) => {
            extract(value).ok_or_else(|| ScanError::invalid("delta operand type mismatch"))
        }
        (DeltaOp::ChangedBy, _) => Err(ScanError::invalid("ChangedBy takes a delta operand")),
        (_, ScanOperand::None) => Ok(T::default()),
        _ => Err(ScanError::invalid(format!(
            "{:?} does not take an operand",
            settings.comparison
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ScanValueType;
    use crate::scan::settings::ScanSettings;

    fn first(value_type: ScanValueType, comparison: ScanComparison, operand: ScanOperand) -> FirstScanComparer {
        let settings = ScanSettings::first_scan(value_type, comparison, operand);
        settings.validate().unwrap();
        FirstScanComparer::compile(&settings).unwrap()
    }

    fn next(value_type: ScanValueType, comparison: ScanComparison, operand: ScanOperand) -> NextScanComparer {
        let settings = ScanSettings::next_scan(value_type, comparison, operand);
        settings.validate().unwrap();
        NextScanComparer::compile(&settings).unwrap()
    }

    #[test]
    fn test_pattern_from_hex_str() {
        let pattern = BytePattern::from_hex_str("4D 5A ?? ??").unwrap();
        assert_eq!(pattern.len(), 4);
        assert_eq!(pattern.to_string(), "4D 5A ?? ??");

        assert!(BytePattern::from_hex_str("").is_err());
        assert!(BytePattern::from_hex_str("GG").is_err());
        assert!(BytePattern::from_hex_str("4D5").is_err());
    }

    #[test]
    fn test_pattern_wildcards_match_anything() {
        let pattern = BytePattern::from_hex_str("4D 5A ?? ??").unwrap();
        assert!(pattern.matches(&[0x4D, 0x5A, 0x00, 0x00]));
        assert!(pattern.matches(&[0x4D, 0x5A, 0xDE, 0xAD]));
        assert!(!pattern.matches(&[0x4D, 0x5B, 0x00, 0x00]));
        assert!(!pattern.matches(&[0x4D]));
    }

    #[test]
    fn test_integer_exact() {
        let comparer = first(
            ScanValueType::Integer,
            ScanComparison::Exact,
            ScanOperand::Value(ScanValue::Integer(10)),
        );
        assert_eq!(comparer.width(), 4);
        assert!(comparer.test(&10i32.to_le_bytes()));
        assert!(!comparer.test(&11i32.to_le_bytes()));
    }

    #[test]
    fn test_integer_ordering_operators() {
        let gt = first(
            ScanValueType::Integer,
            ScanComparison::GreaterThan,
            ScanOperand::Value(ScanValue::Integer(100)),
        );
        assert!(gt.test(&101i32.to_le_bytes()));
        assert!(!gt.test(&100i32.to_le_bytes()));

        let le = first(
            ScanValueType::Integer,
            ScanComparison::LessThanOrEqual,
            ScanOperand::Value(ScanValue::Integer(0)),
        );
        assert!(le.test(&0i32.to_le_bytes()));
        assert!(le.test(&(-5i32).to_le_bytes()));
        assert!(!le.test(&1i32.to_le_bytes()));
    }

    #[test]
    fn test_between_is_inclusive() {
        let comparer = first(
            ScanValueType::Short,
            ScanComparison::Between,
            ScanOperand::Range {
                low: ScanValue::Short(5),
                high: ScanValue::Short(10),
            },
        );
        assert!(comparer.test(&5i16.to_le_bytes()));
        assert!(comparer.test(&10i16.to_le_bytes()));
        assert!(!comparer.test(&4i16.to_le_bytes()));
        assert!(!comparer.test(&11i16.to_le_bytes()));
    }

    #[test]
    fn test_unknown_matches_everything_except_nan() {
        let comparer = first(ScanValueType::Byte, ScanComparison::Unknown, ScanOperand::None);
        assert!(comparer.test(&[0x00]));
        assert!(comparer.test(&[0xFF]));

        let float = first(ScanValueType::Float, ScanComparison::Unknown, ScanOperand::None);
        assert!(float.test(&1.5f32.to_le_bytes()));
        assert!(!float.test(&f32::NAN.to_le_bytes()));
    }

    #[test]
    fn test_big_endian_decode() {
        let settings = ScanSettings::first_scan(
            ScanValueType::Integer,
            ScanComparison::Exact,
            ScanOperand::Value(ScanValue::Integer(0x0102_0304)),
        )
        .with_endianness(Endianness::Big);
        let comparer = FirstScanComparer::compile(&settings).unwrap();
        assert!(comparer.test(&[0x01, 0x02, 0x03, 0x04]));
        assert!(!comparer.test(&[0x04, 0x03, 0x02, 0x01]));
    }

    #[test]
    fn test_float_exact_is_bitwise_without_tolerance() {
        let comparer = first(
            ScanValueType::Float,
            ScanComparison::Exact,
            ScanOperand::Value(ScanValue::Float(1.0)),
        );
        assert!(comparer.test(&1.0f32.to_le_bytes()));
        assert!(!comparer.test(&1.0000001f32.to_le_bytes()));
        // Signed zero: bitwise compare distinguishes 0.0 and -0.0
        let zero = first(
            ScanValueType::Float,
            ScanComparison::Exact,
            ScanOperand::Value(ScanValue::Float(0.0)),
        );
        assert!(!zero.test(&(-0.0f32).to_le_bytes()));
    }

    #[test]
    fn test_float_tolerance() {
        let settings = ScanSettings::first_scan(
            ScanValueType::Float,
            ScanComparison::Exact,
            ScanOperand::Value(ScanValue::Float(1.0)),
        )
        .with_float_tolerance(0.01);
        let comparer = FirstScanComparer::compile(&settings).unwrap();
        assert!(comparer.test(&1.005f32.to_le_bytes()));
        assert!(!comparer.test(&1.02f32.to_le_bytes()));
        // -0.0 is within any tolerance of 0.0
        let settings = ScanSettings::first_scan(
            ScanValueType::Float,
            ScanComparison::Exact,
            ScanOperand::Value(ScanValue::Float(0.0)),
        )
        .with_float_tolerance(0.001);
        let comparer = FirstScanComparer::compile(&settings).unwrap();
        assert!(comparer.test(&(-0.0f32).to_le_bytes()));
    }

    #[test]
    fn test_nan_never_matches() {
        let nan = f32::NAN.to_le_bytes();
        for comparison in [
            ScanComparison::GreaterThan,
            ScanComparison::LessThan,
            ScanComparison::NotEqual,
        ] {
            let comparer = first(
                ScanValueType::Float,
                comparison,
                ScanOperand::Value(ScanValue::Float(0.0)),
            );
            assert!(!comparer.test(&nan), "{comparison:?} must not match NaN");
        }

        // Unchanged with a NaN on either side fails too
        let comparer = next(ScanValueType::Float, ScanComparison::Unchanged, ScanOperand::None);
        assert!(!comparer.test(&nan, &nan));
        assert!(!comparer.test(&1.0f32.to_le_bytes(), &nan));
    }

    #[test]
    fn test_text_case_folding() {
        let needle = TextNeedle::new("Gold", TextEncoding::Utf8);
        let settings = ScanSettings::first_scan(
            ScanValueType::String,
            ScanComparison::Exact,
            ScanOperand::Text(needle),
        );
        let comparer = FirstScanComparer::compile(&settings).unwrap();
        assert!(comparer.test(b"Gold"));
        assert!(!comparer.test(b"gold"));

        let needle = TextNeedle::new("Gold", TextEncoding::Utf8).case_insensitive();
        let settings = ScanSettings::first_scan(
            ScanValueType::String,
            ScanComparison::Exact,
            ScanOperand::Text(needle),
        );
        let comparer = FirstScanComparer::compile(&settings).unwrap();
        assert!(comparer.test(b"GOLD"));
        assert!(comparer.test(b"gold"));
        assert!(!comparer.test(b"geld"));
    }

    #[test]
    fn test_wide_text() {
        let needle = TextNeedle::new("hp", TextEncoding::Utf16);
        assert_eq!(needle.width(), 4);
        assert_eq!(needle.encoded(), vec![b'h', 0, b'p', 0]);

        let settings = ScanSettings::first_scan(
            ScanValueType::String,
            ScanComparison::Exact,
            ScanOperand::Text(needle.case_insensitive()),
        );
        let comparer = FirstScanComparer::compile(&settings).unwrap();
        assert!(comparer.test(&[b'H', 0, b'P', 0]));
        assert!(!comparer.test(&[b'H', 1, b'P', 0]));
    }

    #[test]
    fn test_next_scan_increased_decreased() {
        let increased = next(ScanValueType::Integer, ScanComparison::Increased, ScanOperand::None);
        assert!(increased.test(&15i32.to_le_bytes(), &10i32.to_le_bytes()));
        assert!(!increased.test(&10i32.to_le_bytes(), &10i32.to_le_bytes()));
        assert!(!increased.test(&5i32.to_le_bytes(), &10i32.to_le_bytes()));

        let decreased = next(ScanValueType::Integer, ScanComparison::Decreased, ScanOperand::None);
        assert!(decreased.test(&5i32.to_le_bytes(), &10i32.to_le_bytes()));
        assert!(!decreased.test(&15i32.to_le_bytes(), &10i32.to_le_bytes()));
    }

    #[test]
    fn test_next_scan_changed_by() {
        let comparer = next(
            ScanValueType::Integer,
            ScanComparison::ChangedBy,
            ScanOperand::Value(ScanValue::Integer(-25)),
        );
        assert!(comparer.test(&75i32.to_le_bytes(), &100i32.to_le_bytes()));
        assert!(!comparer.test(&80i32.to_le_bytes(), &100i32.to_le_bytes()));
    }

    #[test]
    fn test_next_scan_changed_by_wraps() {
        let comparer = next(
            ScanValueType::Byte,
            ScanComparison::ChangedBy,
            ScanOperand::Value(ScanValue::Byte(10)),
        );
        assert!(comparer.test(&[4], &[250]));
    }

    #[test]
    fn test_bytes_changed_unchanged() {
        let changed = next(ScanValueType::ArrayOfBytes, ScanComparison::Changed, ScanOperand::None);
        assert!(changed.test(&[1, 2, 3], &[1, 2, 4]));
        assert!(!changed.test(&[1, 2, 3], &[1, 2, 3]));

        let unchanged = next(ScanValueType::String, ScanComparison::Unchanged, ScanOperand::None);
        assert!(unchanged.test(b"abc", b"abc"));
        assert!(!unchanged.test(b"abc", b"abd"));
    }

    #[test]
    fn test_compile_rejects_wrong_mode() {
        let settings = ScanSettings::first_scan(
            ScanValueType::Integer,
            ScanComparison::Exact,
            ScanOperand::Value(ScanValue::Integer(1)),
        );
        assert!(NextScanComparer::compile(&settings).is_err());

        let settings = ScanSettings::next_scan(
            ScanValueType::Integer,
            ScanComparison::Changed,
            ScanOperand::None,
        );
        assert!(FirstScanComparer::compile(&settings).is_err());
    }
}
