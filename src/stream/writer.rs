use std::io::Write;

use tracing::trace;

use super::codec::PacketCodec;
use super::Result;
use crate::types::Packet;

/// Serializes packets in the order they are handed over.
///
/// The writer does not check that groups follow a profile or frames follow a
/// group; emitting a well-formed stream is up to the caller.
#[derive(Debug)]
pub struct StreamWriter<W> {
    sink: W,
    codec: PacketCodec,
    written: usize,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(sink: W, codec: PacketCodec) -> Self {
        Self {
            sink,
            codec,
            written: 0,
        }
    }

    pub fn write(&mut self, packet: &Packet) -> Result<()> {
        self.codec.encode(packet, &mut self.sink)?;
        self.written += 1;
        trace!(kind = ?packet.kind(), written = self.written, "wrote packet");
        Ok(())
    }

    pub fn codec(&self) -> PacketCodec {
        self.codec
    }

    /// Number of packets written so far.
    pub fn packets_written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
