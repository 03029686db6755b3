//! Typed column decoders for the native block format.
//!
//! A column is resolved once from its server type name and then used to read
//! column data and to describe the column to callers.

use std::fmt;
use std::io::Read;

use zerocopy::byteorder::little_endian::{
    F32 as F32LE, F64 as F64LE, I16 as I16LE, I32 as I32LE, I64 as I64LE, U16 as U16LE,
    U32 as U32LE, U64 as U64LE,
};

use crate::constant::{MAX_CAPACITY_HINT, MAX_TYPE_DEPTH};
use crate::error::{Error, Result, eyre};
use crate::protocol::primitive::{read_bytes_fix, read_bytes_varlen, read_fixed_array};
use crate::value::{ScanType, Value};

/// Capability interface of a column kind
pub trait Column: fmt::Debug + Send + Sync {
    /// Server-side type name, e.g. `Nullable(String)`
    fn ch_type(&self) -> &str;

    /// Runtime representation of the values this column produces
    fn scan_type(&self) -> ScanType;

    /// Read `num_rows` values of column data
    fn read(
        &self,
        reader: &mut dyn Read,
        num_rows: usize,
        max_string_size: usize,
    ) -> Result<Vec<Value>>;
}

/// Resolve a column decoder from a server type name
pub fn parse_column(ch_type: &str) -> Result<Box<dyn Column>> {
    resolve(ch_type, 0).ok_or_else(|| Error::UnsupportedColumnType(ch_type.to_string()))
}

fn resolve(ch_type: &str, depth: usize) -> Option<Box<dyn Column>> {
    if depth > MAX_TYPE_DEPTH {
        return None;
    }

    if let Some(kind) = FixedKind::from_name(ch_type) {
        return Some(Box::new(FixedColumn {
            ch_type: ch_type.to_string(),
            kind,
        }));
    }

    match ch_type {
        "String" => return Some(Box::new(StringColumn)),
        "Nothing" => return Some(Box::new(NothingColumn)),
        _ => {}
    }

    if let Some(args) = type_args(ch_type, "FixedString") {
        // FixedString(0) would yield rows without consuming input
        let len = args.trim().parse::<usize>().ok().filter(|len| *len > 0)?;
        return Some(Box::new(FixedStringColumn {
            ch_type: ch_type.to_string(),
            len,
        }));
    }

    // DateTime('Europe/Moscow') is decoded like DateTime
    if type_args(ch_type, "DateTime").is_some() {
        return Some(Box::new(FixedColumn {
            ch_type: ch_type.to_string(),
            kind: FixedKind::DateTime,
        }));
    }

    if let Some(inner) = type_args(ch_type, "Nullable") {
        return Some(Box::new(NullableColumn {
            ch_type: ch_type.to_string(),
            inner: resolve(inner, depth + 1)?,
        }));
    }

    if let Some(inner) = type_args(ch_type, "Array") {
        return Some(Box::new(ArrayColumn {
            ch_type: ch_type.to_string(),
            inner: resolve(inner, depth + 1)?,
        }));
    }

    None
}

/// `Wrapper(args)` -> `args`
fn type_args<'a>(ch_type: &'a str, wrapper: &str) -> Option<&'a str> {
    ch_type
        .strip_prefix(wrapper)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

// ============================================================================
// Fixed-width Columns
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixedKind {
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
    Date,
    DateTime,
}

impl FixedKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Int8" => Some(Self::Int8),
            "Int16" => Some(Self::Int16),
            "Int32" => Some(Self::Int32),
            "Int64" => Some(Self::Int64),
            "UInt8" => Some(Self::UInt8),
            "UInt16" => Some(Self::UInt16),
            "UInt32" => Some(Self::UInt32),
            "UInt64" => Some(Self::UInt64),
            "Float32" => Some(Self::Float32),
            "Float64" => Some(Self::Float64),
            "Date" => Some(Self::Date),
            "DateTime" => Some(Self::DateTime),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct FixedColumn {
    ch_type: String,
    kind: FixedKind,
}

impl Column for FixedColumn {
    fn ch_type(&self) -> &str {
        &self.ch_type
    }

    fn scan_type(&self) -> ScanType {
        match self.kind {
            FixedKind::Int8 => ScanType::Int8,
            FixedKind::Int16 => ScanType::Int16,
            FixedKind::Int32 => ScanType::Int32,
            FixedKind::Int64 => ScanType::Int64,
            FixedKind::UInt8 => ScanType::UInt8,
            FixedKind::UInt16 => ScanType::UInt16,
            FixedKind::UInt32 => ScanType::UInt32,
            FixedKind::UInt64 => ScanType::UInt64,
            FixedKind::Float32 => ScanType::Float32,
            FixedKind::Float64 => ScanType::Float64,
            FixedKind::Date => ScanType::Date,
            FixedKind::DateTime => ScanType::DateTime,
        }
    }

    fn read(&self, reader: &mut dyn Read, num_rows: usize, _: usize) -> Result<Vec<Value>> {
        match self.kind {
            FixedKind::Int8 => read_fixed_array(reader, num_rows, |v: &i8| Value::Int8(*v)),
            FixedKind::Int16 => {
                read_fixed_array(reader, num_rows, |v: &I16LE| Value::Int16(v.get()))
            }
            FixedKind::Int32 => {
                read_fixed_array(reader, num_rows, |v: &I32LE| Value::Int32(v.get()))
            }
            FixedKind::Int64 => {
                read_fixed_array(reader, num_rows, |v: &I64LE| Value::Int64(v.get()))
            }
            FixedKind::UInt8 => read_fixed_array(reader, num_rows, |v: &u8| Value::UInt8(*v)),
            FixedKind::UInt16 => {
                read_fixed_array(reader, num_rows, |v: &U16LE| Value::UInt16(v.get()))
            }
            FixedKind::UInt32 => {
                read_fixed_array(reader, num_rows, |v: &U32LE| Value::UInt32(v.get()))
            }
            FixedKind::UInt64 => {
                read_fixed_array(reader, num_rows, |v: &U64LE| Value::UInt64(v.get()))
            }
            FixedKind::Float32 => {
                read_fixed_array(reader, num_rows, |v: &F32LE| Value::Float32(v.get()))
            }
            FixedKind::Float64 => {
                read_fixed_array(reader, num_rows, |v: &F64LE| Value::Float64(v.get()))
            }
            FixedKind::Date => read_fixed_array(reader, num_rows, |v: &U16LE| Value::Date(v.get())),
            FixedKind::DateTime => {
                read_fixed_array(reader, num_rows, |v: &U32LE| Value::DateTime(v.get()))
            }
        }
    }
}

// ============================================================================
// String Columns
// ============================================================================

#[derive(Debug)]
struct StringColumn;

impl Column for StringColumn {
    fn ch_type(&self) -> &str {
        "String"
    }

    fn scan_type(&self) -> ScanType {
        ScanType::String
    }

    fn read(
        &self,
        reader: &mut dyn Read,
        num_rows: usize,
        max_string_size: usize,
    ) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(num_rows.min(MAX_CAPACITY_HINT));
        for _ in 0..num_rows {
            values.push(Value::String(read_bytes_varlen(reader, max_string_size)?));
        }
        Ok(values)
    }
}

#[derive(Debug)]
struct FixedStringColumn {
    ch_type: String,
    len: usize,
}

impl Column for FixedStringColumn {
    fn ch_type(&self) -> &str {
        &self.ch_type
    }

    fn scan_type(&self) -> ScanType {
        ScanType::FixedString(self.len)
    }

    fn read(
        &self,
        reader: &mut dyn Read,
        num_rows: usize,
        max_string_size: usize,
    ) -> Result<Vec<Value>> {
        if self.len > max_string_size {
            return Err(Error::InvalidPacket);
        }
        let mut values = Vec::with_capacity(num_rows.min(MAX_CAPACITY_HINT));
        for _ in 0..num_rows {
            values.push(Value::String(read_bytes_fix(reader, self.len)?));
        }
        Ok(values)
    }
}

// ============================================================================
// Composite Columns
// ============================================================================

/// `Nothing` carries one placeholder byte per row
#[derive(Debug)]
struct NothingColumn;

impl Column for NothingColumn {
    fn ch_type(&self) -> &str {
        "Nothing"
    }

    fn scan_type(&self) -> ScanType {
        ScanType::Nothing
    }

    fn read(&self, reader: &mut dyn Read, num_rows: usize, _: usize) -> Result<Vec<Value>> {
        read_bytes_fix(reader, num_rows)?;
        Ok(vec![Value::Null; num_rows])
    }
}

/// Null map (1 byte per row) followed by the nested column.
/// Rows flagged in the null map still carry a placeholder value in the nested column.
#[derive(Debug)]
struct NullableColumn {
    ch_type: String,
    inner: Box<dyn Column>,
}

impl Column for NullableColumn {
    fn ch_type(&self) -> &str {
        &self.ch_type
    }

    fn scan_type(&self) -> ScanType {
        ScanType::Nullable(Box::new(self.inner.scan_type()))
    }

    fn read(
        &self,
        reader: &mut dyn Read,
        num_rows: usize,
        max_string_size: usize,
    ) -> Result<Vec<Value>> {
        let null_map = read_bytes_fix(reader, num_rows)?;
        let mut values = self.inner.read(reader, num_rows, max_string_size)?;
        for (value, is_null) in values.iter_mut().zip(null_map) {
            if is_null != 0 {
                *value = Value::Null;
            }
        }
        Ok(values)
    }
}

/// Cumulative end offsets (8 bytes per row) followed by the flattened nested column
#[derive(Debug)]
struct ArrayColumn {
    ch_type: String,
    inner: Box<dyn Column>,
}

impl Column for ArrayColumn {
    fn ch_type(&self) -> &str {
        &self.ch_type
    }

    fn scan_type(&self) -> ScanType {
        ScanType::Array(Box::new(self.inner.scan_type()))
    }

    fn read(
        &self,
        reader: &mut dyn Read,
        num_rows: usize,
        max_string_size: usize,
    ) -> Result<Vec<Value>> {
        let offsets = read_fixed_array(reader, num_rows, |v: &U64LE| v.get())?;
        if offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::InvalidPacket);
        }
        let total = offsets.last().copied().unwrap_or(0);
        let total = usize::try_from(total).map_err(|_| Error::InvalidPacket)?;

        let mut flat = self.inner.read(reader, total, max_string_size)?.into_iter();
        let mut values = Vec::with_capacity(num_rows.min(MAX_CAPACITY_HINT));
        let mut start = 0u64;
        for end in offsets {
            let len = usize::try_from(end - start).map_err(|_| Error::InvalidPacket)?;
            let items: Vec<Value> = flat.by_ref().take(len).collect();
            if items.len() != len {
                return Err(Error::LibraryBug(eyre!(
                    "array column {} yielded {} of {} items",
                    self.ch_type,
                    items.len(),
                    len
                )));
            }
            values.push(Value::Array(items));
            start = end;
        }
        Ok(values)
    }
}
