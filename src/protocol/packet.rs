use crate::constant::ServerPacketCode;
use crate::error::{Error, Result};
use crate::protocol::block::Block;
use crate::protocol::response::{ProfileInfo, Progress, ServerException};
use crate::protocol::r#trait::PacketReader;

/// Packet kinds that may appear while a query result is streaming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Exception,
    Progress,
    ProfileInfo,
    Data,
    Totals,
    Extremes,
    EndOfStream,
}

impl PacketKind {
    /// `None` for every code that is not valid inside a result stream
    pub fn from_code(code: u64) -> Option<Self> {
        match ServerPacketCode::from_u64(code)? {
            ServerPacketCode::Exception => Some(Self::Exception),
            ServerPacketCode::Progress => Some(Self::Progress),
            ServerPacketCode::ProfileInfo => Some(Self::ProfileInfo),
            ServerPacketCode::Data => Some(Self::Data),
            ServerPacketCode::Totals => Some(Self::Totals),
            ServerPacketCode::Extremes => Some(Self::Extremes),
            ServerPacketCode::EndOfStream => Some(Self::EndOfStream),
            ServerPacketCode::Hello | ServerPacketCode::Pong => None,
        }
    }
}

/// A decoded server packet
#[derive(Debug)]
pub enum ServerPacket {
    Exception(ServerException),
    Progress(Progress),
    ProfileInfo(ProfileInfo),
    Data(Block),
    Totals(Block),
    Extremes(Block),
    EndOfStream,
}

impl ServerPacket {
    /// Read one packet tag and its payload
    ///
    /// An unknown tag means the byte stream can no longer be trusted: the reader is
    /// closed before `Error::UnexpectedPacket` is returned.
    pub fn read<P: PacketReader + ?Sized>(reader: &mut P) -> Result<Self> {
        let code = reader.read_uvarint()?;
        let Some(kind) = PacketKind::from_code(code) else {
            if let Err(err) = reader.close() {
                tracing::warn!(packet = code, error = %err, "failed to close desynchronized connection");
            }
            return Err(Error::UnexpectedPacket(code));
        };

        Ok(match kind {
            PacketKind::Exception => ServerPacket::Exception(reader.read_exception()?),
            PacketKind::Progress => ServerPacket::Progress(reader.read_progress()?),
            PacketKind::ProfileInfo => ServerPacket::ProfileInfo(reader.read_profile_info()?),
            PacketKind::Data => ServerPacket::Data(reader.read_block()?),
            PacketKind::Totals => ServerPacket::Totals(reader.read_block()?),
            PacketKind::Extremes => ServerPacket::Extremes(reader.read_block()?),
            PacketKind::EndOfStream => ServerPacket::EndOfStream,
        })
    }

    pub fn kind(&self) -> PacketKind {
        match self {
            ServerPacket::Exception(_) => PacketKind::Exception,
            ServerPacket::Progress(_) => PacketKind::Progress,
            ServerPacket::ProfileInfo(_) => PacketKind::ProfileInfo,
            ServerPacket::Data(_) => PacketKind::Data,
            ServerPacket::Totals(_) => PacketKind::Totals,
            ServerPacket::Extremes(_) => PacketKind::Extremes,
            ServerPacket::EndOfStream => PacketKind::EndOfStream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_kind_from_code() {
        assert_eq!(PacketKind::from_code(1), Some(PacketKind::Data));
        assert_eq!(PacketKind::from_code(2), Some(PacketKind::Exception));
        assert_eq!(PacketKind::from_code(3), Some(PacketKind::Progress));
        assert_eq!(PacketKind::from_code(5), Some(PacketKind::EndOfStream));
        assert_eq!(PacketKind::from_code(6), Some(PacketKind::ProfileInfo));
        assert_eq!(PacketKind::from_code(7), Some(PacketKind::Totals));
        assert_eq!(PacketKind::from_code(8), Some(PacketKind::Extremes));
    }

    #[test]
    fn test_packet_kind_rejects_non_result_codes() {
        // Hello and Pong only answer client Hello/Ping
        assert_eq!(PacketKind::from_code(0), None);
        assert_eq!(PacketKind::from_code(4), None);
        assert_eq!(PacketKind::from_code(9), None);
        assert_eq!(PacketKind::from_code(u64::MAX), None);
    }
}
