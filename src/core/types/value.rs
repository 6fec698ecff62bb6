//! Scan value types and endianness-aware byte decoding

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte order used to decode numeric values read from the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// The value type a scan searches for; fixes element width and decode rule.
///
/// `Byte` decodes unsigned, `Short`/`Integer`/`Long` decode signed,
/// `Float`/`Double` are IEEE-754 binary32/binary64. `ArrayOfBytes` and
/// `String` have a width fixed by their operand, not by the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanValueType {
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    ArrayOfBytes,
    String,
}

impl ScanValueType {
    /// Returns the element width in bytes, or `None` for operand-sized types
    pub fn width(&self) -> Option<usize> {
        match self {
            ScanValueType::Byte => Some(1),
            ScanValueType::Short => Some(2),
            ScanValueType::Integer | ScanValueType::Float => Some(4),
            ScanValueType::Long | ScanValueType::Double => Some(8),
            ScanValueType::ArrayOfBytes | ScanValueType::String => None,
        }
    }

    /// True for the six fixed-width numeric types
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ScanValueType::ArrayOfBytes | ScanValueType::String)
    }

    /// True for Float and Double
    pub fn is_float(&self) -> bool {
        matches!(self, ScanValueType::Float | ScanValueType::Double)
    }

    /// Default candidate stride for this type: the element width, or 1
    pub fn natural_alignment(&self) -> u64 {
        self.width().unwrap_or(1) as u64
    }
}

impl fmt::Display for ScanValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanValueType::Byte => "byte",
            ScanValueType::Short => "short",
            ScanValueType::Integer => "integer",
            ScanValueType::Long => "long",
            ScanValueType::Float => "float",
            ScanValueType::Double => "double",
            ScanValueType::ArrayOfBytes => "array_of_bytes",
            ScanValueType::String => "string",
        };
        write!(f, "{name}")
    }
}

/// A decoded value observed at a match address, or a comparison operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScanValue {
    Byte(u8),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    Text(String),
}

impl ScanValue {
    /// Gets the value type enum for this value
    pub fn value_type(&self) -> ScanValueType {
        match self {
            ScanValue::Byte(_) => ScanValueType::Byte,
            ScanValue::Short(_) => ScanValueType::Short,
            ScanValue::Integer(_) => ScanValueType::Integer,
            ScanValue::Long(_) => ScanValueType::Long,
            ScanValue::Float(_) => ScanValueType::Float,
            ScanValue::Double(_) => ScanValueType::Double,
            ScanValue::Bytes(_) => ScanValueType::ArrayOfBytes,
            ScanValue::Text(_) => ScanValueType::String,
        }
    }

    /// Returns the size in bytes of the value
    pub fn width(&self) -> usize {
        match self {
            ScanValue::Byte(_) => 1,
            ScanValue::Short(_) => 2,
            ScanValue::Integer(_) | ScanValue::Float(_) => 4,
            ScanValue::Long(_) | ScanValue::Double(_) => 8,
            ScanValue::Bytes(b) => b.len(),
            ScanValue::Text(s) => s.len(),
        }
    }

    /// Encodes the value to bytes in the given byte order
    pub fn to_bytes(&self, endianness: Endianness) -> Vec<u8> {
        match endianness {
            Endianness::Little => match self {
                ScanValue::Byte(v) => v.to_le_bytes().to_vec(),
                ScanValue::Short(v) => v.to_le_bytes().to_vec(),
                ScanValue::Integer(v) => v.to_le_bytes().to_vec(),
                ScanValue::Long(v) => v.to_le_bytes().to_vec(),
                ScanValue::Float(v) => v.to_le_bytes().to_vec(),
                ScanValue::Double(v) => v.to_le_bytes().to_vec(),
                ScanValue::Bytes(b) => b.clone(),
                ScanValue::Text(s) => s.as_bytes().to_vec(),
            },
            Endianness::Big => match self {
                ScanValue::Byte(v) => v.to_be_bytes().to_vec(),
                ScanValue::Short(v) => v.to_be_bytes().to_vec(),
                ScanValue::Integer(v) => v.to_be_bytes().to_vec(),
                ScanValue::Long(v) => v.to_be_bytes().to_vec(),
                ScanValue::Float(v) => v.to_be_bytes().to_vec(),
                ScanValue::Double(v) => v.to_be_bytes().to_vec(),
                ScanValue::Bytes(b) => b.clone(),
                ScanValue::Text(s) => s.as_bytes().to_vec(),
            },
        }
    }

    /// Decodes a value of the given type from bytes.
    ///
    /// Returns `None` if the slice is too short, or for `String` bytes that
    /// are not valid UTF-8.
    pub fn from_bytes(
        bytes: &[u8],
        value_type: ScanValueType,
        endianness: Endianness,
    ) -> Option<Self> {
        if let Some(width) = value_type.width() {
            if bytes.len() < width {
                return None;
            }
        }

        let le = endianness == Endianness::Little;
        match value_type {
            ScanValueType::Byte => bytes.first().map(|&b| ScanValue::Byte(b)),
            ScanValueType::Short => {
                let arr = [bytes[0], bytes[1]];
                Some(ScanValue::Short(if le {
                    i16::from_le_bytes(arr)
                } else {
                    i16::from_be_bytes(arr)
                }))
            }
            ScanValueType::Integer => {
                let arr = [bytes[0], bytes[1], bytes[2], bytes[3]];
                Some(ScanValue::Integer(if le {
                    i32::from_le_bytes(arr)
                } else {
                    i32::from_be_bytes(arr)
                }))
            }
            ScanValueType::Long => {
                let arr = [
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
                ];
                Some(ScanValue::Long(if le {
                    i64::from_le_bytes(arr)
                } else {
                    i64::from_be_bytes(arr)
                }))
            }
            ScanValueType::Float => {
                let arr = [bytes[0], bytes[1], bytes[2], bytes[3]];
                Some(ScanValue::Float(if le {
                    f32::from_le_bytes(arr)
                } else {
                    f32::from_be_bytes(arr)
                }))
            }
            ScanValueType::Double => {
                let arr = [
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
                ];
                Some(ScanValue::Double(if le {
                    f64::from_le_bytes(arr)
                } else {
                    f64::from_be_bytes(arr)
                }))
            }
            ScanValueType::ArrayOfBytes => Some(ScanValue::Bytes(bytes.to_vec())),
            ScanValueType::String => String::from_utf8(bytes.to_vec()).ok().map(ScanValue::Text),
        }
    }

    /// Decodes like [`from_bytes`](Self::from_bytes), but falls back to
    /// `Bytes` for string windows that are not valid UTF-8 (wide-string
    /// scans land here).
    pub fn from_bytes_lossy(
        bytes: &[u8],
        value_type: ScanValueType,
        endianness: Endianness,
    ) -> Option<Self> {
        match Self::from_bytes(bytes, value_type, endianness) {
            Some(v) => Some(v),
            None if value_type == ScanValueType::String => Some(ScanValue::Bytes(bytes.to_vec())),
            None => None,
        }
    }
}

impl fmt::Display for ScanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanValue::Byte(v) => write!(f, "{v}"),
            ScanValue::Short(v) => write!(f, "{v}"),
            ScanValue::Integer(v) => write!(f, "{v}"),
            ScanValue::Long(v) => write!(f, "{v}"),
            ScanValue::Float(v) => write!(f, "{v}"),
            ScanValue::Double(v) => write!(f, "{v}"),
            ScanValue::Bytes(b) => write!(f, "{}", hex::encode_upper(b)),
            ScanValue::Text(s) => write!(f, "\"{s}\""),
        }
    }
}
