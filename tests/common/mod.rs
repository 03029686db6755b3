//! Builders for server packet sequences in the native wire format

#![allow(dead_code)]

use std::io::Cursor;

use zero_clickhouse::constant::ServerPacketCode;
use zero_clickhouse::protocol::BlockInfo;
use zero_clickhouse::protocol::primitive::*;
use zero_clickhouse::{NativeReader, ResultStream};

pub type TestStream = ResultStream<NativeReader<Cursor<Vec<u8>>>>;

/// One encoded column of a block
pub struct Col {
    name: String,
    ch_type: String,
    data: Vec<u8>,
}

impl Col {
    pub fn new(name: &str, ch_type: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            ch_type: ch_type.to_string(),
            data,
        }
    }

    pub fn int32(name: &str, values: &[i32]) -> Self {
        let mut data = Vec::new();
        for v in values {
            write_int_4(&mut data, *v as u32);
        }
        Self::new(name, "Int32", data)
    }

    pub fn uint64(name: &str, values: &[u64]) -> Self {
        let mut data = Vec::new();
        for v in values {
            write_int_8(&mut data, *v);
        }
        Self::new(name, "UInt64", data)
    }

    pub fn string(name: &str, values: &[&str]) -> Self {
        let mut data = Vec::new();
        for v in values {
            write_string(&mut data, v);
        }
        Self::new(name, "String", data)
    }

    pub fn nullable_string(name: &str, values: &[Option<&str>]) -> Self {
        let mut data = Vec::new();
        for v in values {
            write_bool(&mut data, v.is_none());
        }
        for v in values {
            write_string(&mut data, v.unwrap_or(""));
        }
        Self::new(name, "Nullable(String)", data)
    }

    pub fn array_uint64(name: &str, values: &[&[u64]]) -> Self {
        let mut data = Vec::new();
        let mut offset = 0u64;
        for v in values {
            offset += v.len() as u64;
            write_int_8(&mut data, offset);
        }
        for v in values.iter().flat_map(|v| v.iter()) {
            write_int_8(&mut data, *v);
        }
        Self::new(name, "Array(UInt64)", data)
    }
}

/// Server packets in wire order, for the default protocol revision
#[derive(Default)]
pub struct Wire {
    out: Vec<u8>,
    in_exception: bool,
}

impl Wire {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, code: u64) -> Self {
        write_uvarint(&mut self.out, code);
        self
    }

    fn block(mut self, code: ServerPacketCode, num_rows: usize, cols: Vec<Col>) -> Self {
        write_uvarint(&mut self.out, code as u64);
        write_string(&mut self.out, "");
        BlockInfo::default().write(&mut self.out);
        write_uvarint(&mut self.out, cols.len() as u64);
        write_uvarint(&mut self.out, num_rows as u64);
        for col in cols {
            write_string(&mut self.out, &col.name);
            write_string(&mut self.out, &col.ch_type);
            self.out.extend_from_slice(&col.data);
        }
        self
    }

    pub fn data(self, num_rows: usize, cols: Vec<Col>) -> Self {
        self.block(ServerPacketCode::Data, num_rows, cols)
    }

    pub fn totals(self, num_rows: usize, cols: Vec<Col>) -> Self {
        self.block(ServerPacketCode::Totals, num_rows, cols)
    }

    pub fn extremes(self, num_rows: usize, cols: Vec<Col>) -> Self {
        self.block(ServerPacketCode::Extremes, num_rows, cols)
    }

    pub fn progress(mut self, rows: u64, bytes: u64, total_rows: u64) -> Self {
        write_uvarint(&mut self.out, ServerPacketCode::Progress as u64);
        write_uvarint(&mut self.out, rows);
        write_uvarint(&mut self.out, bytes);
        write_uvarint(&mut self.out, total_rows);
        self
    }

    pub fn profile_info(mut self, rows: u64, blocks: u64, bytes: u64) -> Self {
        write_uvarint(&mut self.out, ServerPacketCode::ProfileInfo as u64);
        write_uvarint(&mut self.out, rows);
        write_uvarint(&mut self.out, blocks);
        write_uvarint(&mut self.out, bytes);
        write_bool(&mut self.out, false);
        write_uvarint(&mut self.out, 0);
        write_bool(&mut self.out, false);
        self
    }

    /// An exception packet, or the last link of one opened by `nested_exception`
    pub fn exception(mut self, code: i32, message: &str) -> Self {
        if !self.in_exception {
            write_uvarint(&mut self.out, ServerPacketCode::Exception as u64);
        }
        self.in_exception = false;
        self.exception_body(code, message, false)
    }

    /// Start an exception whose cause follows as the next exception
    pub fn nested_exception(mut self, code: i32, message: &str) -> Self {
        if !self.in_exception {
            write_uvarint(&mut self.out, ServerPacketCode::Exception as u64);
            self.in_exception = true;
        }
        self.exception_body(code, message, true)
    }

    fn exception_body(mut self, code: i32, message: &str, has_nested: bool) -> Self {
        write_int_4(&mut self.out, code as u32);
        write_string(&mut self.out, "DB::Exception");
        write_string(&mut self.out, message);
        write_string(&mut self.out, "");
        write_bool(&mut self.out, has_nested);
        self
    }

    pub fn end_of_stream(self) -> Self {
        self.tag(ServerPacketCode::EndOfStream as u64)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    pub fn into_reader(self) -> NativeReader<Cursor<Vec<u8>>> {
        NativeReader::new(Cursor::new(self.out))
    }

    pub fn into_stream(self) -> TestStream {
        ResultStream::new(self.into_reader())
    }
}

/// The usual leading packet: column names and types, no rows
pub fn header(cols: &[(&str, &str)]) -> Vec<Col> {
    cols.iter()
        .map(|(name, ch_type)| Col::new(name, ch_type, Vec::new()))
        .collect()
}

/// Route library logs to the test harness output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}
