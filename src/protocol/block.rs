use std::io::Read;
use std::sync::Arc;

use crate::col::{Column, parse_column};
use crate::constant::{MAX_CAPACITY_HINT, MIN_REVISION_WITH_BLOCK_INFO};
use crate::error::{Error, Result, eyre};
use crate::protocol::primitive::*;
use crate::value::Value;

/// Block header
///
/// Encoded as numbered fields terminated by field number 0:
/// - 1: is_overflows (1 byte)
/// - 2: bucket_num (4 bytes, little-endian, signed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub is_overflows: bool,
    pub bucket_num: i32,
}

impl Default for BlockInfo {
    fn default() -> Self {
        Self {
            is_overflows: false,
            bucket_num: -1,
        }
    }
}

impl BlockInfo {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut info = Self::default();
        loop {
            match read_uvarint(reader)? {
                0 => return Ok(info),
                1 => info.is_overflows = read_bool(reader)?,
                2 => info.bucket_num = read_int_4_signed(reader)?,
                _ => return Err(Error::InvalidPacket),
            }
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        write_uvarint(out, 1);
        write_bool(out, self.is_overflows);
        write_uvarint(out, 2);
        write_int_4(out, self.bucket_num as u32);
        write_uvarint(out, 0);
    }
}

/// Column-major unit of result data
///
/// `values[c][r]` is the value of column `c` in row `r`.
#[derive(Debug, Default)]
pub struct Block {
    pub info: BlockInfo,
    names: Vec<String>,
    columns: Vec<Arc<dyn Column>>,
    values: Vec<Vec<Value>>,
    num_rows: usize,
}

impl Block {
    /// Build a block from already decoded columns
    ///
    /// Every column must hold exactly `num_rows` values.
    pub fn new(
        names: Vec<String>,
        columns: Vec<Arc<dyn Column>>,
        values: Vec<Vec<Value>>,
        num_rows: usize,
    ) -> Result<Self> {
        if names.len() != columns.len() || names.len() != values.len() {
            return Err(Error::LibraryBug(eyre!(
                "block shape mismatch: {} names, {} columns, {} value arrays",
                names.len(),
                columns.len(),
                values.len()
            )));
        }
        if let Some(col) = values.iter().position(|v| v.len() != num_rows) {
            return Err(Error::LibraryBug(eyre!(
                "column {} holds {} values, expected {}",
                col,
                values[col].len(),
                num_rows
            )));
        }

        Ok(Self {
            info: BlockInfo::default(),
            names,
            columns,
            values,
            num_rows,
        })
    }

    /// Decode a block body: optional header, dimensions, then every column
    pub fn read<R: Read>(reader: &mut R, revision: u64, max_string_size: usize) -> Result<Self> {
        let info = if revision >= MIN_REVISION_WITH_BLOCK_INFO {
            BlockInfo::read(reader)?
        } else {
            BlockInfo::default()
        };

        let num_columns = read_len(reader, usize::MAX)?;
        let num_rows = read_len(reader, usize::MAX)?;

        let mut names = Vec::with_capacity(num_columns.min(MAX_CAPACITY_HINT));
        let mut columns = Vec::with_capacity(num_columns.min(MAX_CAPACITY_HINT));
        let mut values = Vec::with_capacity(num_columns.min(MAX_CAPACITY_HINT));
        for _ in 0..num_columns {
            names.push(read_string(reader, max_string_size)?);
            let ch_type = read_string(reader, max_string_size)?;
            let column: Arc<dyn Column> = Arc::from(parse_column(&ch_type)?);
            values.push(column.read(reader, num_rows, max_string_size)?);
            columns.push(column);
        }

        let mut block = Self::new(names, columns, values, num_rows)?;
        block.info = info;
        Ok(block)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Arc<dyn Column>] {
        &self.columns
    }

    /// Values of column `idx`, in row order
    pub fn column_values(&self, idx: usize) -> Option<&[Value]> {
        self.values.get(idx).map(Vec::as_slice)
    }

    /// Copy the block out as row-major tuples
    ///
    /// `rows[r][c] == column_values(c)[r]`. The block itself is left untouched.
    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        (0..self.num_rows)
            .map(|row| self.values.iter().map(|column| column[row].clone()).collect())
            .collect()
    }

    /// Release the column storage
    pub fn reset(&mut self) {
        self.names = Vec::new();
        self.columns = Vec::new();
        self.values = Vec::new();
        self.num_rows = 0;
    }
}
