//! Binary packet codec.
//!
//! Every packet starts with a one-byte tag followed by fixed-width fields in
//! the stream's byte order:
//!
//! ```text
//! Profile (tag 1)
//!   band_count u8, bin_count u16, frame_length u16, frame_spacing u16,
//!   sample_rate u16, silence_threshold f32,
//!   band_freqs [f32; band_count + 2], bin_freqs [f32; bin_count]
//!
//! GroupHeader (tag 2)
//!   source_len u8, label_len u8, start_offset i32,
//!   source [u8; source_len], label [u8; label_len]
//!
//! Frame (tag 3)
//!   band_powers [f32; band_count], bin_powers [f32; bin_count],
//!   coefficient sets [f32; band_count] * coefficient_sets
//! ```
//!
//! Frames carry no length field, so decoding one needs the active profile.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Deserialize;

use super::{Result, StreamError};
use crate::types::{FrameLayout, GroupHeader, Packet, PacketKind, Profile};

/// Byte order of every multi-byte field in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

macro_rules! ordered_io {
    ($read:ident, $write:ident, $ty:ty) => {
        fn $read<R: Read>(self, src: &mut R) -> io::Result<$ty> {
            match self {
                ByteOrder::Little => src.$read::<LittleEndian>(),
                ByteOrder::Big => src.$read::<BigEndian>(),
            }
        }

        fn $write<W: Write>(self, sink: &mut W, value: $ty) -> io::Result<()> {
            match self {
                ByteOrder::Little => sink.$write::<LittleEndian>(value),
                ByteOrder::Big => sink.$write::<BigEndian>(value),
            }
        }
    };
}

impl ByteOrder {
    ordered_io!(read_u16, write_u16, u16);
    ordered_io!(read_i32, write_i32, i32);
    ordered_io!(read_f32, write_f32, f32);

    fn read_floats<R: Read>(self, src: &mut R, count: usize) -> io::Result<Vec<f32>> {
        let mut values = vec![0.0_f32; count];
        match self {
            ByteOrder::Little => src.read_f32_into::<LittleEndian>(&mut values)?,
            ByteOrder::Big => src.read_f32_into::<BigEndian>(&mut values)?,
        }
        Ok(values)
    }

    fn write_floats<W: Write>(self, sink: &mut W, values: &[f32]) -> io::Result<()> {
        for &value in values {
            self.write_f32(sink, value)?;
        }
        Ok(())
    }
}

/// Byte source that remembers how far it has read, for error reporting.
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    position: u64,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

/// Packet contents exactly as they appear on the wire, before the reader
/// attaches sequence numbers, parents and sample offsets.
#[derive(Debug, Clone, PartialEq)]
pub enum WirePacket {
    /// Decoded profile; its `seq` is left at zero.
    Profile(Profile),
    GroupHeader {
        source: String,
        label: String,
        start_offset: i32,
    },
    Frame {
        band_powers: Vec<f32>,
        bin_powers: Vec<f32>,
        coefficients: Vec<Vec<f32>>,
    },
}

/// Encodes and decodes single packets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketCodec {
    pub byte_order: ByteOrder,
    pub layout: FrameLayout,
}

impl PacketCodec {
    pub fn new(byte_order: ByteOrder, layout: FrameLayout) -> Self {
        Self { byte_order, layout }
    }

    /// Decode the next packet, or `None` when the source is exhausted at a
    /// packet boundary. `profile` sizes frame payloads.
    pub fn decode<R: Read>(
        &self,
        src: &mut CountingReader<R>,
        profile: Option<&Profile>,
    ) -> Result<Option<WirePacket>> {
        let offset = src.position();
        let Some(tag) = read_tag(src)? else {
            return Ok(None);
        };
        let kind = PacketKind::from_tag(tag).ok_or(StreamError::UnknownTag { tag, offset })?;

        let packet = match kind {
            PacketKind::Profile => self.decode_profile(src),
            PacketKind::GroupHeader => self.decode_group(src),
            PacketKind::Frame => {
                let profile = profile.ok_or(StreamError::FrameWithoutProfile { offset })?;
                self.decode_frame(src, profile)
            }
        };
        packet.map(Some).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => StreamError::Truncated { kind, offset },
            _ => StreamError::Io(err),
        })
    }

    fn decode_profile<R: Read>(&self, src: &mut R) -> io::Result<WirePacket> {
        let order = self.byte_order;
        let band_count = src.read_u8()?;
        let bin_count = order.read_u16(src)?;
        let frame_length = order.read_u16(src)?;
        let frame_spacing = order.read_u16(src)?;
        let sample_rate = order.read_u16(src)?;
        let silence_threshold = order.read_f32(src)?;
        let band_freqs = order.read_floats(src, band_count as usize + 2)?;
        let bin_freqs = order.read_floats(src, bin_count as usize)?;

        Ok(WirePacket::Profile(Profile {
            seq: 0,
            frame_length,
            frame_spacing,
            sample_rate,
            silence_threshold,
            band_count,
            bin_count,
            band_freqs,
            bin_freqs,
        }))
    }

    fn decode_group<R: Read>(&self, src: &mut R) -> io::Result<WirePacket> {
        let source_len = src.read_u8()? as usize;
        let label_len = src.read_u8()? as usize;
        let start_offset = self.byte_order.read_i32(src)?;

        let mut bytes = vec![0u8; source_len + label_len];
        src.read_exact(&mut bytes)?;
        let (source, label) = bytes.split_at(source_len);

        Ok(WirePacket::GroupHeader {
            source: String::from_utf8_lossy(source).into_owned(),
            label: String::from_utf8_lossy(label).into_owned(),
            start_offset,
        })
    }

    fn decode_frame<R: Read>(&self, src: &mut R, profile: &Profile) -> io::Result<WirePacket> {
        let bands = profile.band_count as usize;
        let mut floats = self
            .byte_order
            .read_floats(src, self.layout.frame_floats(profile))?
            .into_iter();

        let band_powers: Vec<f32> = floats.by_ref().take(bands).collect();
        let bin_powers: Vec<f32> = floats.by_ref().take(profile.bin_count as usize).collect();
        let coefficients = (0..self.layout.coefficient_sets)
            .map(|_| floats.by_ref().take(bands).collect())
            .collect();

        Ok(WirePacket::Frame {
            band_powers,
            bin_powers,
            coefficients,
        })
    }

    /// Serialize one packet. Sequence numbers and frame sample offsets are
    /// implied by stream position and are not written.
    pub fn encode<W: Write>(&self, packet: &Packet, sink: &mut W) -> Result<()> {
        let bytes = self.encode_to_vec(packet)?;
        sink.write_all(&bytes)?;
        Ok(())
    }

    pub fn encode_to_vec(&self, packet: &Packet) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        buf.push(packet.kind().tag());
        match packet {
            Packet::Profile(profile) => self.encode_profile(profile, &mut buf)?,
            Packet::GroupHeader(group) => self.encode_group(group, &mut buf)?,
            Packet::Frame(frame) => {
                frame.check_dimensions()?;
                if frame.coefficients.len() != self.layout.coefficient_sets {
                    return Err(StreamError::invalid(format!(
                        "frame carries {} coefficient sets, stream layout expects {}",
                        frame.coefficients.len(),
                        self.layout.coefficient_sets
                    )));
                }
                let order = self.byte_order;
                order.write_floats(&mut buf, &frame.band_powers)?;
                order.write_floats(&mut buf, &frame.bin_powers)?;
                for set in &frame.coefficients {
                    order.write_floats(&mut buf, set)?;
                }
            }
        }
        Ok(buf)
    }

    fn encode_profile(&self, profile: &Profile, buf: &mut Vec<u8>) -> Result<()> {
        if profile.band_freqs.len() != profile.band_count as usize + 2 {
            return Err(StreamError::invalid(format!(
                "profile declares {} bands but carries {} band edges",
                profile.band_count,
                profile.band_freqs.len()
            )));
        }
        if profile.bin_freqs.len() != profile.bin_count as usize {
            return Err(StreamError::invalid(format!(
                "profile declares {} bins but carries {} bin frequencies",
                profile.bin_count,
                profile.bin_freqs.len()
            )));
        }

        let order = self.byte_order;
        buf.write_u8(profile.band_count)?;
        order.write_u16(buf, profile.bin_count)?;
        order.write_u16(buf, profile.frame_length)?;
        order.write_u16(buf, profile.frame_spacing)?;
        order.write_u16(buf, profile.sample_rate)?;
        order.write_f32(buf, profile.silence_threshold)?;
        order.write_floats(buf, &profile.band_freqs)?;
        order.write_floats(buf, &profile.bin_freqs)?;
        Ok(())
    }

    fn encode_group(&self, group: &GroupHeader, buf: &mut Vec<u8>) -> Result<()> {
        let source_len = u8::try_from(group.source.len())
            .map_err(|_| StreamError::invalid("group source longer than 255 bytes"))?;
        let label_len = u8::try_from(group.label.len())
            .map_err(|_| StreamError::invalid("group label longer than 255 bytes"))?;

        buf.write_u8(source_len)?;
        buf.write_u8(label_len)?;
        self.byte_order.write_i32(buf, group.start_offset)?;
        buf.extend_from_slice(group.source.as_bytes());
        buf.extend_from_slice(group.label.as_bytes());
        Ok(())
    }
}

fn read_tag<R: Read>(src: &mut R) -> Result<Option<u8>> {
    let mut tag = [0u8; 1];
    loop {
        match src.read(&mut tag) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(tag[0])),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(StreamError::Io(err)),
        }
    }
}
