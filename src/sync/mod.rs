mod reader;
mod stream;

pub use reader::NativeReader;
pub use stream::ResultStream;
