//! Error types for reading and writing packet streams.

use thiserror::Error;

use crate::types::PacketKind;

/// Errors raised by the packet codec, stream reader and stream writer.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The tag byte at the start of a packet names no known packet kind.
    #[error("unrecognized packet tag {tag} at byte {offset}")]
    UnknownTag { tag: u8, offset: u64 },

    /// A frame arrived before any profile sized its payload.
    #[error("frame packet at byte {offset} precedes any profile")]
    FrameWithoutProfile { offset: u64 },

    /// A frame arrived before any group header claimed it.
    #[error("frame packet at byte {offset} precedes any group header")]
    FrameWithoutGroup { offset: u64 },

    /// A group header arrived before any profile.
    #[error("group header at byte {offset} precedes any profile")]
    GroupWithoutProfile { offset: u64 },

    /// The stream ended partway through a packet.
    #[error("stream truncated inside {kind:?} packet at byte {offset}")]
    Truncated { kind: PacketKind, offset: u64 },

    /// A packet cannot be represented on the wire.
    #[error("invalid packet: {message}")]
    InvalidPacket { message: String },

    #[error("stream I/O failed")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        StreamError::InvalidPacket {
            message: message.into(),
        }
    }

    /// Structural violations of the profile/group/frame hierarchy or tag set.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            StreamError::UnknownTag { .. }
                | StreamError::FrameWithoutProfile { .. }
                | StreamError::FrameWithoutGroup { .. }
                | StreamError::GroupWithoutProfile { .. }
        )
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, StreamError::Truncated { .. })
    }
}

/// Convenient alias for results returned by stream modules.
pub type Result<T> = std::result::Result<T, StreamError>;
