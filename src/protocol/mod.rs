pub mod block;
pub mod packet;
pub mod primitive;
pub mod response;
pub mod r#trait;

pub use block::{Block, BlockInfo};
pub use packet::{PacketKind, ServerPacket};
pub use r#trait::PacketReader;
