use std::io::{self, Read};

use zerocopy::byteorder::little_endian::{I32 as I32LE, U16 as U16LE, U32 as U32LE, U64 as U64LE};
use zerocopy::{FromBytes, FromZeros, IntoBytes};

use crate::constant::{MAX_CAPACITY_HINT, MAX_VARINT_LEN};
use crate::error::{Error, Result};

/// Read 1-byte integer
pub fn read_int_1<R: Read + ?Sized>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Read 2-byte little-endian integer
pub fn read_int_2<R: Read + ?Sized>(reader: &mut R) -> Result<u16> {
    let mut value = U16LE::new_zeroed();
    reader.read_exact(value.as_mut_bytes())?;
    Ok(value.get())
}

/// Read 4-byte little-endian integer
pub fn read_int_4<R: Read + ?Sized>(reader: &mut R) -> Result<u32> {
    let mut value = U32LE::new_zeroed();
    reader.read_exact(value.as_mut_bytes())?;
    Ok(value.get())
}

/// Read 4-byte little-endian signed integer
pub fn read_int_4_signed<R: Read + ?Sized>(reader: &mut R) -> Result<i32> {
    let mut value = I32LE::new_zeroed();
    reader.read_exact(value.as_mut_bytes())?;
    Ok(value.get())
}

/// Read 8-byte little-endian integer
pub fn read_int_8<R: Read + ?Sized>(reader: &mut R) -> Result<u64> {
    let mut value = U64LE::new_zeroed();
    reader.read_exact(value.as_mut_bytes())?;
    Ok(value.get())
}

/// Read a 1-byte boolean
pub fn read_bool<R: Read + ?Sized>(reader: &mut R) -> Result<bool> {
    Ok(read_int_1(reader)? != 0)
}

/// Read unsigned LEB128 integer
pub fn read_uvarint<R: Read + ?Sized>(reader: &mut R) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        let byte = read_int_1(reader)?;
        // The 10th byte may only contribute the top bit of a u64
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(Error::InvalidPacket);
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::InvalidPacket)
}

/// Read a varint length and check it against `max_len`
pub fn read_len<R: Read + ?Sized>(reader: &mut R, max_len: usize) -> Result<usize> {
    let len = read_uvarint(reader)?;
    match usize::try_from(len) {
        Ok(len) if len <= max_len => Ok(len),
        _ => Err(Error::InvalidPacket),
    }
}

/// Read fixed-length bytes
///
/// `len` usually comes off the wire, so the buffer grows with the bytes that
/// actually arrive instead of being allocated up front.
pub fn read_bytes_fix<R: Read + ?Sized>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let limit = u64::try_from(len).map_err(|_| Error::InvalidPacket)?;
    let mut bytes = Vec::with_capacity(len.min(MAX_CAPACITY_HINT));
    Read::take(&mut *reader, limit).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(Error::IoError(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, got {}", len, bytes.len()),
        )));
    }
    Ok(bytes)
}

/// Read length-prefixed bytes
pub fn read_bytes_varlen<R: Read + ?Sized>(reader: &mut R, max_len: usize) -> Result<Vec<u8>> {
    let len = read_len(reader, max_len)?;
    read_bytes_fix(reader, len)
}

/// Read length-prefixed UTF-8 string
pub fn read_string<R: Read + ?Sized>(reader: &mut R, max_len: usize) -> Result<String> {
    let bytes = read_bytes_varlen(reader, max_len)?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidPacket)
}

/// Read `count` fixed-width little-endian values in one read and map each of them
pub fn read_fixed_array<T, V, R>(reader: &mut R, count: usize, f: impl Fn(&T) -> V) -> Result<Vec<V>>
where
    T: FromBytes + zerocopy::KnownLayout + zerocopy::Immutable + zerocopy::Unaligned,
    R: Read + ?Sized,
{
    let len = count
        .checked_mul(size_of::<T>())
        .ok_or(Error::InvalidPacket)?;
    let bytes = read_bytes_fix(reader, len)?;
    let values = <[T]>::ref_from_bytes(&bytes).map_err(|_| Error::InvalidPacket)?;
    Ok(values.iter().map(f).collect())
}

/// Write 1-byte integer
pub fn write_int_1(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

/// Write 2-byte little-endian integer
pub fn write_int_2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Write 4-byte little-endian integer
pub fn write_int_4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Write 8-byte little-endian integer
pub fn write_int_8(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Write a 1-byte boolean
pub fn write_bool(out: &mut Vec<u8>, value: bool) {
    out.push(u8::from(value));
}

/// Write unsigned LEB128 integer
pub fn write_uvarint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Write length-prefixed bytes
pub fn write_bytes_varlen(out: &mut Vec<u8>, data: &[u8]) {
    write_uvarint(out, data.len() as u64);
    out.extend_from_slice(data);
}

/// Write length-prefixed string
pub fn write_string(out: &mut Vec<u8>, s: &str) {
    write_bytes_varlen(out, s.as_bytes());
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_uvarint_single_byte() {
        let mut out = Vec::new();
        write_uvarint(&mut out, 5);
        assert_eq!(out, [0x05]);
        assert_eq!(read_uvarint(&mut Cursor::new(out)).unwrap(), 5);
    }

    #[test]
    fn test_uvarint_multi_byte() {
        let mut out = Vec::new();
        write_uvarint(&mut out, 300);
        assert_eq!(out, [0xAC, 0x02]);
        assert_eq!(read_uvarint(&mut Cursor::new(out)).unwrap(), 300);
    }

    #[test]
    fn test_uvarint_max() {
        let mut out = Vec::new();
        write_uvarint(&mut out, u64::MAX);
        assert_eq!(out.len(), MAX_VARINT_LEN);
        assert_eq!(read_uvarint(&mut Cursor::new(out)).unwrap(), u64::MAX);
    }

    #[test]
    fn test_uvarint_overflow() {
        let data = [0xFFu8; 11];
        assert!(matches!(
            read_uvarint(&mut Cursor::new(&data[..])),
            Err(Error::InvalidPacket)
        ));
    }

    #[test]
    fn test_uvarint_truncated() {
        let data = [0x80u8];
        assert!(matches!(
            read_uvarint(&mut Cursor::new(&data[..])),
            Err(Error::IoError(_))
        ));
    }

    #[test]
    fn test_fixed_width_integers() {
        let mut out = Vec::new();
        write_int_1(&mut out, 0xAB);
        write_int_2(&mut out, 0x1234);
        write_int_4(&mut out, 0xDEADBEEF);
        write_int_4(&mut out, (-7i32) as u32);
        write_int_8(&mut out, 0x0102030405060708);
        write_bool(&mut out, true);

        let mut reader = Cursor::new(out);
        assert_eq!(read_int_1(&mut reader).unwrap(), 0xAB);
        assert_eq!(read_int_2(&mut reader).unwrap(), 0x1234);
        assert_eq!(read_int_4(&mut reader).unwrap(), 0xDEADBEEF);
        assert_eq!(read_int_4_signed(&mut reader).unwrap(), -7);
        assert_eq!(read_int_8(&mut reader).unwrap(), 0x0102030405060708);
        assert!(read_bool(&mut reader).unwrap());
    }

    #[test]
    fn test_string() {
        let mut out = Vec::new();
        write_string(&mut out, "hello");
        assert_eq!(out[0], 5);
        assert_eq!(read_string(&mut Cursor::new(out), 1024).unwrap(), "hello");
    }

    #[test]
    fn test_string_too_long() {
        let mut out = Vec::new();
        write_string(&mut out, "hello");
        assert!(matches!(
            read_string(&mut Cursor::new(out), 4),
            Err(Error::InvalidPacket)
        ));
    }

    #[test]
    fn test_string_invalid_utf8() {
        let mut out = Vec::new();
        write_bytes_varlen(&mut out, &[0xC3, 0x28]);
        assert!(matches!(
            read_string(&mut Cursor::new(out), 1024),
            Err(Error::InvalidPacket)
        ));
    }

    #[test]
    fn test_bytes_fix_short_read() {
        match read_bytes_fix(&mut Cursor::new(vec![1u8, 2, 3]), 5) {
            Err(Error::IoError(err)) => assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected UnexpectedEof, got {:?}", other),
        }
    }

    #[test]
    fn test_bytes_fix_huge_length() {
        // Only the bytes present are buffered
        match read_bytes_fix(&mut Cursor::new(vec![0u8; 16]), usize::MAX) {
            Err(Error::IoError(err)) => assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected UnexpectedEof, got {:?}", other),
        }
    }

    #[test]
    fn test_fixed_array_huge_count() {
        let result = read_fixed_array(&mut Cursor::new(vec![0u8; 8]), 1 << 60, |v: &U64LE| v.get());
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_fixed_array() {
        let mut out = Vec::new();
        for v in [1u32, 2, 0xFFFF_FFFF] {
            write_int_4(&mut out, v);
        }
        let values =
            read_fixed_array(&mut Cursor::new(out), 3, |v: &U32LE| v.get()).unwrap();
        assert_eq!(values, [1, 2, 0xFFFF_FFFF]);
    }

    #[test]
    fn test_fixed_array_empty() {
        let values =
            read_fixed_array(&mut Cursor::new(Vec::new()), 0, |v: &U64LE| v.get()).unwrap();
        assert!(values.is_empty());
    }
}
