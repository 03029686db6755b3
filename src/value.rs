/// ClickHouse Native Protocol Value Types
use std::fmt;

use simdutf8::basic::from_utf8;

/// A single cell of a result row
///
/// Values are produced by the column decoder and relocated into rows unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// NULL of a `Nullable(T)` column, or a `Nothing` placeholder
    #[default]
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    /// String and FixedString. ClickHouse strings are arbitrary bytes.
    String(Vec<u8>),
    /// Days since 1970-01-01
    Date(u16),
    /// Seconds since the Unix epoch
    DateTime(u32),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow a string value as UTF-8
    ///
    /// Returns `None` for non-string values and for strings that are not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(bytes) => from_utf8(bytes).ok(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Widen any signed or unsigned integer that fits into `i64`
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int8(v) => Some(i64::from(v)),
            Value::Int16(v) => Some(i64::from(v)),
            Value::Int32(v) => Some(i64::from(v)),
            Value::Int64(v) => Some(v),
            Value::UInt8(v) => Some(i64::from(v)),
            Value::UInt16(v) => Some(i64::from(v)),
            Value::UInt32(v) => Some(i64::from(v)),
            Value::UInt64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float32(v) => Some(f64::from(v)),
            Value::Float64(v) => Some(v),
            _ => None,
        }
    }

    #[cfg(feature = "with-chrono")]
    pub fn to_naive_date(&self) -> Option<chrono::NaiveDate> {
        match *self {
            Value::Date(days) => chrono::NaiveDate::from_ymd_opt(1970, 1, 1)?
                .checked_add_days(chrono::Days::new(u64::from(days))),
            _ => None,
        }
    }

    #[cfg(feature = "with-chrono")]
    pub fn to_naive_date_time(&self) -> Option<chrono::NaiveDateTime> {
        match *self {
            Value::DateTime(secs) => {
                chrono::DateTime::from_timestamp(i64::from(secs), 0).map(|dt| dt.naive_utc())
            }
            Value::Date(_) => self.to_naive_date()?.and_hms_opt(0, 0, 0),
            _ => None,
        }
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::UInt8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::UInt16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ============================================================================
// Scan Types
// ============================================================================

/// Runtime representation of a column's values
///
/// Every `Value` produced by a column matches its `ScanType`, except that a
/// `Nullable(T)` column yields either `Value::Null` or a value of `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    FixedString(usize),
    Date,
    DateTime,
    Nothing,
    Nullable(Box<ScanType>),
    Array(Box<ScanType>),
}

impl ScanType {
    pub fn is_nullable(&self) -> bool {
        matches!(self, ScanType::Nullable(_))
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanType::Int8 => f.write_str("i8"),
            ScanType::Int16 => f.write_str("i16"),
            ScanType::Int32 => f.write_str("i32"),
            ScanType::Int64 => f.write_str("i64"),
            ScanType::UInt8 => f.write_str("u8"),
            ScanType::UInt16 => f.write_str("u16"),
            ScanType::UInt32 => f.write_str("u32"),
            ScanType::UInt64 => f.write_str("u64"),
            ScanType::Float32 => f.write_str("f32"),
            ScanType::Float64 => f.write_str("f64"),
            ScanType::String => f.write_str("string"),
            ScanType::FixedString(len) => write!(f, "[u8; {}]", len),
            ScanType::Date => f.write_str("date"),
            ScanType::DateTime => f.write_str("datetime"),
            ScanType::Nothing => f.write_str("null"),
            ScanType::Nullable(inner) => write!(f, "Option<{}>", inner),
            ScanType::Array(inner) => write!(f, "Vec<{}>", inner),
        }
    }
}
