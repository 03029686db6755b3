use std::io::Read;

use crate::constant::{
    MAX_NESTED_EXCEPTIONS, MIN_REVISION_WITH_CLIENT_WRITE_INFO,
    MIN_REVISION_WITH_TOTAL_ROWS_IN_PROGRESS,
};
use crate::error::{Error, Result, eyre};
use crate::protocol::primitive::*;

/// Exception packet
///
/// Layout:
/// - code: 4 bytes (little-endian, signed)
/// - name, message, stack_trace: length-prefixed strings
/// - has_nested: 1 byte, followed by the nested exception if set
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("code: {}, message: {}", self.code, self.message)]
pub struct ServerException {
    pub code: i32,
    pub name: String,
    pub message: String,
    pub stack_trace: String,
    #[source]
    pub nested: Option<Box<ServerException>>,
}

impl ServerException {
    /// Read an exception and its nested chain, outermost first
    pub fn read<R: Read + ?Sized>(reader: &mut R, max_string_size: usize) -> Result<Self> {
        let mut chain = Vec::new();
        loop {
            if chain.len() >= MAX_NESTED_EXCEPTIONS {
                return Err(Error::InvalidPacket);
            }
            chain.push(Self {
                code: read_int_4_signed(reader)?,
                name: read_string(reader, max_string_size)?,
                message: read_string(reader, max_string_size)?,
                stack_trace: read_string(reader, max_string_size)?,
                nested: None,
            });
            if !read_bool(reader)? {
                break;
            }
        }

        let Some(mut head) = chain.pop() else {
            return Err(Error::LibraryBug(eyre!("empty exception chain")));
        };
        while let Some(mut outer) = chain.pop() {
            outer.nested = Some(Box::new(head));
            head = outer;
        }
        Ok(head)
    }
}

/// Progress packet
///
/// Counters are deltas since the previous progress packet of the same query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub rows: u64,
    pub bytes: u64,
    pub total_rows: u64,
    pub written_rows: u64,
    pub written_bytes: u64,
}

impl Progress {
    pub fn read<R: Read + ?Sized>(reader: &mut R, revision: u64) -> Result<Self> {
        let mut progress = Self {
            rows: read_uvarint(reader)?,
            bytes: read_uvarint(reader)?,
            ..Default::default()
        };

        if revision >= MIN_REVISION_WITH_TOTAL_ROWS_IN_PROGRESS {
            progress.total_rows = read_uvarint(reader)?;
        }

        if revision >= MIN_REVISION_WITH_CLIENT_WRITE_INFO {
            progress.written_rows = read_uvarint(reader)?;
            progress.written_bytes = read_uvarint(reader)?;
        }

        Ok(progress)
    }

    /// Fold a delta into a running total
    pub fn accumulate(&mut self, delta: &Progress) {
        self.rows = self.rows.saturating_add(delta.rows);
        self.bytes = self.bytes.saturating_add(delta.bytes);
        self.total_rows = self.total_rows.saturating_add(delta.total_rows);
        self.written_rows = self.written_rows.saturating_add(delta.written_rows);
        self.written_bytes = self.written_bytes.saturating_add(delta.written_bytes);
    }
}

/// ProfileInfo packet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileInfo {
    pub rows: u64,
    pub blocks: u64,
    pub bytes: u64,
    pub applied_limit: bool,
    pub rows_before_limit: u64,
    pub calculated_rows_before_limit: bool,
}

impl ProfileInfo {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            rows: read_uvarint(reader)?,
            blocks: read_uvarint(reader)?,
            bytes: read_uvarint(reader)?,
            applied_limit: read_bool(reader)?,
            rows_before_limit: read_uvarint(reader)?,
            calculated_rows_before_limit: read_bool(reader)?,
        })
    }
}
