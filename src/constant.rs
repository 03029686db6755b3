/// Server packet codes of the native protocol
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPacketCode {
    Hello = 0,
    Data = 1,
    Exception = 2,
    Progress = 3,
    Pong = 4,
    EndOfStream = 5,
    ProfileInfo = 6,
    Totals = 7,
    Extremes = 8,
}

impl ServerPacketCode {
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Hello),
            1 => Some(Self::Data),
            2 => Some(Self::Exception),
            3 => Some(Self::Progress),
            4 => Some(Self::Pong),
            5 => Some(Self::EndOfStream),
            6 => Some(Self::ProfileInfo),
            7 => Some(Self::Totals),
            8 => Some(Self::Extremes),
            _ => None,
        }
    }
}

/// Protocol revision advertised by this client when none is configured
pub const CLIENT_REVISION: u64 = 54213;

/// Data packets are prefixed with a temporary table name
pub const MIN_REVISION_WITH_TEMPORARY_TABLES: u64 = 50264;

/// Progress packets carry `total_rows`
pub const MIN_REVISION_WITH_TOTAL_ROWS_IN_PROGRESS: u64 = 51554;

/// Blocks start with a `BlockInfo` header
pub const MIN_REVISION_WITH_BLOCK_INFO: u64 = 51903;

/// Progress packets carry `written_rows` and `written_bytes`
pub const MIN_REVISION_WITH_CLIENT_WRITE_INFO: u64 = 54420;

/// Upper bound for a single string read off the wire (1 GiB)
pub const DEFAULT_MAX_STRING_SIZE: usize = 1 << 30;

/// Longest valid encoding of a `u64` as LEB128
pub const MAX_VARINT_LEN: usize = 10;

/// Largest capacity reserved up front from a count read off the wire.
/// Buffers grow past this only as data actually arrives.
pub const MAX_CAPACITY_HINT: usize = 4096;

/// Deepest `Nullable(..)`/`Array(..)` nesting accepted in a column type
pub const MAX_TYPE_DEPTH: usize = 32;

/// Longest chain of nested server exceptions accepted in one packet
pub const MAX_NESTED_EXCEPTIONS: usize = 64;
