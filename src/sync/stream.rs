use std::sync::Arc;

use crate::col::Column;
use crate::error::{Error, Result};
use crate::protocol::block::Block;
use crate::protocol::packet::ServerPacket;
use crate::protocol::r#trait::PacketReader;
use crate::protocol::response::{ProfileInfo, Progress};
use crate::value::{ScanType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// No block with columns has arrived yet
    Unresolved,
    Streaming,
    /// EndOfStream or a fatal error was observed. No more reads.
    Terminated,
}

/// Which result set the row buffer currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Active {
    Main,
    Deferred,
}

/// Where the rows of a received block go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockRoute {
    Main,
    Totals,
    Extremes,
}

/// Result sets that arrive inline but are handed out only on request
#[derive(Debug, Default)]
struct Deferred {
    totals: Vec<Vec<Value>>,
    extremes: Vec<Vec<Value>>,
}

impl Deferred {
    fn is_empty(&self) -> bool {
        self.totals.is_empty() && self.extremes.is_empty()
    }

    /// Totals always drain before extremes
    fn pop(&mut self) -> Option<Vec<Vec<Value>>> {
        if !self.totals.is_empty() {
            Some(std::mem::take(&mut self.totals))
        } else if !self.extremes.is_empty() {
            Some(std::mem::take(&mut self.extremes))
        } else {
            None
        }
    }
}

/// Rows of one query result, decoded from the packets of a single connection
///
/// Rows of the main result set come out of [`ResultStream::next_into`] (or the
/// `Iterator` impl). Totals and extremes are buffered as they arrive and become
/// the active result set through [`ResultStream::next_result_set`].
pub struct ResultStream<P> {
    reader: P,
    state: StreamState,
    active: Active,
    columns: Vec<String>,
    block_columns: Vec<Arc<dyn Column>>,
    index: usize,
    values: Vec<Vec<Value>>,
    deferred: Deferred,
    /// Read-ahead failure held back until the row delivered before it was consumed
    pending_error: Option<Error>,
    progress: Progress,
    profile_info: Option<ProfileInfo>,
}

impl<P: PacketReader> ResultStream<P> {
    /// Start consuming a query result from `reader`
    ///
    /// Nothing is read until rows or columns are requested.
    pub fn new(reader: P) -> Self {
        Self {
            reader,
            state: StreamState::Unresolved,
            active: Active::Main,
            columns: Vec::new(),
            block_columns: Vec::new(),
            index: 0,
            values: Vec::new(),
            deferred: Deferred::default(),
            pending_error: None,
            progress: Progress::default(),
            profile_info: None,
        }
    }

    /// Column names of the result
    ///
    /// If no block has been seen yet this performs one dispatch cycle first.
    pub fn columns(&mut self) -> Result<&[String]> {
        if self.columns.is_empty() {
            self.advance()?;
        }
        Ok(&self.columns)
    }

    /// Runtime representation of column `idx`, or `None` before the columns are known
    pub fn column_type(&self, idx: usize) -> Option<ScanType> {
        self.block_columns.get(idx).map(|col| col.scan_type())
    }

    /// Server-side type name of column `idx`, or `None` before the columns are known
    pub fn column_database_type_name(&self, idx: usize) -> Option<&str> {
        self.block_columns.get(idx).map(|col| col.ch_type())
    }

    /// Move the next row into `dest`
    ///
    /// # Returns
    /// * `Ok(true)` - `dest` holds the next row
    /// * `Ok(false)` - the active result set has no more rows
    /// * `Err(Error)` - the server reported an exception or the connection failed
    pub fn next_into(&mut self, dest: &mut [Value]) -> Result<bool> {
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }
        if !self.fill()? {
            return Ok(false);
        }

        let row = &mut self.values[self.index];
        if dest.len() != row.len() {
            return Err(Error::BadUsageError(format!(
                "row has {} columns but destination has {} slots",
                row.len(),
                dest.len()
            )));
        }
        for (slot, value) in dest.iter_mut().zip(row.iter_mut()) {
            *slot = std::mem::take(value);
        }
        self.index += 1;

        // Read ahead so that an EndOfStream right after this block is seen now
        // rather than reported as more data.
        if self.index >= self.values.len() && self.active == Active::Main {
            self.values.clear();
            self.index = 0;
            if let Err(err) = self.fill() {
                self.pending_error = Some(err);
            }
        }
        Ok(true)
    }

    /// Take the next row as an owned vector
    pub fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }
        if !self.fill()? {
            return Ok(None);
        }
        let mut row = vec![Value::Null; self.values[self.index].len()];
        self.next_into(&mut row)?;
        Ok(Some(row))
    }

    /// Whether totals or extremes are waiting to be read
    pub fn has_more_result_sets(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Make the next deferred result set active: totals first, then extremes
    ///
    /// Unread rows of the current result set are discarded. No packets are read.
    /// Returns `false` if there is no further result set.
    pub fn next_result_set(&mut self) -> bool {
        match self.deferred.pop() {
            Some(rows) => {
                self.values = rows;
                self.index = 0;
                self.active = Active::Deferred;
                true
            }
            None => false,
        }
    }

    /// Accumulated progress reported by the server
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// The last profiling summary reported by the server
    pub fn profile_info(&self) -> Option<&ProfileInfo> {
        self.profile_info.as_ref()
    }

    /// Whether the server has finished sending, or the stream failed
    pub fn is_terminated(&self) -> bool {
        self.state == StreamState::Terminated
    }

    /// Drop all buffered rows. Safe to call any number of times.
    pub fn close(&mut self) -> Result<()> {
        self.state = StreamState::Terminated;
        self.values = Vec::new();
        self.index = 0;
        self.deferred = Deferred::default();
        self.pending_error = None;
        Ok(())
    }

    /// Give back the reader
    pub fn into_inner(self) -> P {
        self.reader
    }

    /// Dispatch until the active buffer has a row
    ///
    /// Returns `false` once the active result set is exhausted.
    fn fill(&mut self) -> Result<bool> {
        while self.index >= self.values.len() {
            if self.state == StreamState::Terminated || self.active == Active::Deferred {
                return Ok(false);
            }
            self.advance()?;
        }
        Ok(true)
    }

    /// One dispatch cycle. Any error terminates the stream.
    fn advance(&mut self) -> Result<()> {
        if self.state == StreamState::Terminated {
            return Ok(());
        }
        let result = self.dispatch();
        if result.is_err() {
            self.state = StreamState::Terminated;
        }
        result
    }

    #[tracing::instrument(skip_all)]
    fn dispatch(&mut self) -> Result<()> {
        loop {
            match ServerPacket::read(&mut self.reader)? {
                ServerPacket::Exception(exception) => {
                    tracing::debug!(code = exception.code, "[receive data] <- exception");
                    return Err(Error::ServerError(exception));
                }
                ServerPacket::Progress(progress) => {
                    tracing::debug!(
                        rows = progress.rows,
                        bytes = progress.bytes,
                        total_rows = progress.total_rows,
                        "[receive data] <- progress"
                    );
                    self.progress.accumulate(&progress);
                }
                ServerPacket::ProfileInfo(info) => {
                    tracing::debug!(
                        rows = info.rows,
                        bytes = info.bytes,
                        blocks = info.blocks,
                        "[receive data] <- profiling"
                    );
                    self.profile_info = Some(info);
                }
                ServerPacket::Data(block) => {
                    if self.receive_block(BlockRoute::Main, block) {
                        return Ok(());
                    }
                }
                ServerPacket::Totals(block) => {
                    if self.receive_block(BlockRoute::Totals, block) {
                        return Ok(());
                    }
                }
                ServerPacket::Extremes(block) => {
                    if self.receive_block(BlockRoute::Extremes, block) {
                        return Ok(());
                    }
                }
                ServerPacket::EndOfStream => {
                    tracing::debug!("[receive data] <- end of stream");
                    self.state = StreamState::Terminated;
                    return Ok(());
                }
            }
        }
    }

    /// Route a block to its result set. Returns `true` when the dispatch cycle is done.
    fn receive_block(&mut self, route: BlockRoute, mut block: Block) -> bool {
        tracing::debug!(
            route = ?route,
            columns = block.num_columns(),
            rows = block.num_rows(),
            "[receive data] <- data"
        );

        if self.state == StreamState::Unresolved && block.num_columns() != 0 {
            self.columns = block.column_names().to_vec();
            self.block_columns = block.columns().to_vec();
            self.state = StreamState::Streaming;
            if block.num_rows() == 0 {
                return true;
            }
        }

        let rows = block.to_rows();
        block.reset();
        match route {
            BlockRoute::Totals => {
                self.deferred.totals.extend(rows);
                false
            }
            BlockRoute::Extremes => {
                self.deferred.extremes.extend(rows);
                false
            }
            BlockRoute::Main => {
                self.index = 0;
                self.values = rows;
                true
            }
        }
    }
}

impl<P: PacketReader> Iterator for ResultStream<P> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}
