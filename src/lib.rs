pub mod col;
pub mod constant;
pub mod error;
mod opts;
pub mod protocol;
pub mod sync;
pub mod value;

pub use opts::Opts;
pub use sync::{NativeReader, ResultStream};
pub use value::{ScanType, Value};
