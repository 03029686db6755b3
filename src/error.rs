use thiserror::Error;

pub use color_eyre::eyre::eyre;

use crate::protocol::response::ServerException;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Server Error: {0}")]
    ServerError(#[from] ServerException),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unexpected packet [{0}] from server")]
    UnexpectedPacket(u64),

    #[error("Invalid packet")]
    InvalidPacket,

    #[error("Unsupported column type: {0}")]
    UnsupportedColumnType(String),

    #[error("Bad config error: {0}")]
    BadConfigError(String),

    #[error("Bad usage error: {0}")]
    BadUsageError(String),

    #[error("Library bug: {0}")]
    LibraryBug(color_eyre::Report),
}

impl Error {
    /// Returns `true` if the server reported a query-level error
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::ServerError(_))
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(err: std::convert::Infallible) -> Self {
        match err {}
    }
}

pub type Result<T> = std::result::Result<T, Error>;
