use std::io::{self, Read};

use crate::constant::MIN_REVISION_WITH_TEMPORARY_TABLES;
use crate::error::{Error, Result};
use crate::opts::Opts;
use crate::protocol::block::Block;
use crate::protocol::primitive::{read_string, read_uvarint};
use crate::protocol::r#trait::PacketReader;
use crate::protocol::response::{ProfileInfo, Progress, ServerException};

/// Native-format packet decoder over a blocking byte stream
///
/// Wrap sockets in a `BufReader`: the decoder issues many small reads.
pub struct NativeReader<R> {
    stream: Option<R>,
    opts: Opts,
}

impl<R: Read> NativeReader<R> {
    /// Create a decoder with default options
    pub fn new(stream: R) -> Self {
        Self {
            stream: Some(stream),
            opts: Opts::default(),
        }
    }

    /// Create a decoder from options or anything that converts into them (e.g. a DSN)
    pub fn with_opts<O: TryInto<Opts>>(stream: R, opts: O) -> Result<Self>
    where
        Error: From<O::Error>,
    {
        let opts: Opts = opts.try_into()?;
        opts.validate()?;
        Ok(Self {
            stream: Some(stream),
            opts,
        })
    }

    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Give back the byte stream, or `None` if the reader was closed
    pub fn into_inner(self) -> Option<R> {
        self.stream
    }

    fn stream(&mut self) -> Result<&mut R> {
        self.stream.as_mut().ok_or_else(|| {
            Error::IoError(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection is closed",
            ))
        })
    }
}

impl<R: Read> PacketReader for NativeReader<R> {
    fn read_uvarint(&mut self) -> Result<u64> {
        read_uvarint(self.stream()?)
    }

    #[tracing::instrument(skip_all)]
    fn read_block(&mut self) -> Result<Block> {
        let Opts {
            revision,
            max_string_size,
            ..
        } = self.opts;
        let stream = self.stream()?;
        if revision >= MIN_REVISION_WITH_TEMPORARY_TABLES {
            // External table name. Always empty for query results.
            let _table_name = read_string(stream, max_string_size)?;
        }
        Block::read(stream, revision, max_string_size)
    }

    fn read_exception(&mut self) -> Result<ServerException> {
        let max_string_size = self.opts.max_string_size;
        ServerException::read(self.stream()?, max_string_size)
    }

    fn read_progress(&mut self) -> Result<Progress> {
        let revision = self.opts.revision;
        Progress::read(self.stream()?, revision)
    }

    fn read_profile_info(&mut self) -> Result<ProfileInfo> {
        ProfileInfo::read(self.stream()?)
    }

    fn close(&mut self) -> Result<()> {
        // Dropping the stream closes the socket
        self.stream = None;
        Ok(())
    }
}
