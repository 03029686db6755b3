use auto_impl::auto_impl;

use crate::error::Result;
use crate::protocol::block::Block;
use crate::protocol::response::{ProfileInfo, Progress, ServerException};

/// Blocking decoder side of a connection that is streaming a query result
///
/// Every method may fail with an I/O error. After `close()`, reads must fail
/// instead of touching the underlying byte stream.
#[auto_impl(&mut, Box)]
pub trait PacketReader {
    /// Read a packet tag or any other unsigned varint
    fn read_uvarint(&mut self) -> Result<u64>;

    /// Read the block carried by a Data, Totals or Extremes packet
    fn read_block(&mut self) -> Result<Block>;

    fn read_exception(&mut self) -> Result<ServerException>;

    fn read_progress(&mut self) -> Result<Progress>;

    fn read_profile_info(&mut self) -> Result<ProfileInfo>;

    /// Shut the connection down. Must be idempotent.
    fn close(&mut self) -> Result<()>;
}
