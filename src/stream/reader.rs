use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use tracing::debug;

use super::codec::{CountingReader, PacketCodec, WirePacket};
use super::{Result, StreamError};
use crate::types::{Frame, GroupHeader, Packet, Profile};

/// Every packet of a stream, split by kind and kept in stream order.
#[derive(Debug, Clone, Default)]
pub struct StreamContents {
    pub profiles: Vec<Arc<Profile>>,
    pub groups: Vec<Arc<GroupHeader>>,
    pub frames: Vec<Frame>,
}

/// Forward-only packet reader.
///
/// Tracks the active profile and group so frames can be sized and linked to
/// their parents, and assigns each frame the running sample offset of its
/// group.
#[derive(Debug)]
pub struct StreamReader<R> {
    src: CountingReader<R>,
    codec: PacketCodec,
    seekable: bool,
    current_profile: Option<Arc<Profile>>,
    current_group: Option<Arc<GroupHeader>>,
    sample_offset: i64,
    profile_seq: u32,
    group_seq: u32,
    frame_seq: u32,
}

impl<R: Read> StreamReader<R> {
    /// Reader that never probes `src`; [`is_seekable`](Self::is_seekable)
    /// reports `false` whatever the source. Use
    /// [`with_seek_probe`](StreamReader::with_seek_probe) to probe.
    pub fn new(src: R, codec: PacketCodec) -> Self {
        Self::build(src, codec, false)
    }

    fn build(src: R, codec: PacketCodec, seekable: bool) -> Self {
        Self {
            src: CountingReader::new(src),
            codec,
            seekable,
            current_profile: None,
            current_group: None,
            sample_offset: 0,
            profile_seq: 0,
            group_seq: 0,
            frame_seq: 0,
        }
    }

    /// Whether the underlying source answered a position probe.
    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    pub fn current_profile(&self) -> Option<&Arc<Profile>> {
        self.current_profile.as_ref()
    }

    pub fn current_group(&self) -> Option<&Arc<GroupHeader>> {
        self.current_group.as_ref()
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.src.position()
    }

    pub fn codec(&self) -> PacketCodec {
        self.codec
    }

    /// Decode the next packet, or `None` at a clean end of stream.
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        let offset = self.src.position();
        let decoded = self
            .codec
            .decode(&mut self.src, self.current_profile.as_deref())?;
        let Some(wire) = decoded else {
            return Ok(None);
        };

        let packet = match wire {
            WirePacket::Profile(profile) => {
                self.profile_seq += 1;
                let profile = Arc::new(Profile {
                    seq: self.profile_seq,
                    ..profile
                });
                debug!(
                    seq = profile.seq,
                    bands = profile.band_count,
                    bins = profile.bin_count,
                    sample_rate = profile.sample_rate,
                    "profile"
                );
                // A group belongs to one profile; frames after a new profile
                // need a new group header.
                self.current_group = None;
                self.current_profile = Some(Arc::clone(&profile));
                Packet::Profile(profile)
            }
            WirePacket::GroupHeader {
                source,
                label,
                start_offset,
            } => {
                let profile = self
                    .current_profile
                    .clone()
                    .ok_or(StreamError::GroupWithoutProfile { offset })?;
                self.group_seq += 1;
                let group = Arc::new(GroupHeader {
                    seq: self.group_seq,
                    profile,
                    source,
                    label,
                    start_offset,
                });
                debug!(
                    seq = group.seq,
                    source = %group.source,
                    label = %group.label,
                    start = group.start_offset,
                    "group header"
                );
                self.sample_offset = i64::from(start_offset);
                self.current_group = Some(Arc::clone(&group));
                Packet::GroupHeader(group)
            }
            WirePacket::Frame {
                band_powers,
                bin_powers,
                coefficients,
            } => {
                let group = self
                    .current_group
                    .clone()
                    .ok_or(StreamError::FrameWithoutGroup { offset })?;
                self.frame_seq += 1;
                let spacing = group.profile.frame_spacing;
                let frame = Frame {
                    seq: self.frame_seq,
                    group,
                    band_powers,
                    bin_powers,
                    coefficients,
                    sample_offset: self.sample_offset,
                };
                self.sample_offset += i64::from(spacing);
                Packet::Frame(frame)
            }
        };
        Ok(Some(packet))
    }

    /// Drain the rest of the stream.
    pub fn read_all(&mut self) -> Result<StreamContents> {
        let mut contents = StreamContents::default();
        while let Some(packet) = self.next_packet()? {
            match packet {
                Packet::Profile(profile) => contents.profiles.push(profile),
                Packet::GroupHeader(group) => contents.groups.push(group),
                Packet::Frame(frame) => contents.frames.push(frame),
            }
        }
        debug!(
            profiles = contents.profiles.len(),
            groups = contents.groups.len(),
            frames = contents.frames.len(),
            "drained stream"
        );
        Ok(contents)
    }

    /// Decode packets until the next frame.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        while let Some(packet) = self.next_packet()? {
            if let Packet::Frame(frame) = packet {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    pub fn into_inner(self) -> R {
        self.src.into_inner()
    }
}

impl<R: Read + Seek> StreamReader<R> {
    /// Reader that probes `src` once for random positioning.
    pub fn with_seek_probe(mut src: R, codec: PacketCodec) -> Self {
        let seekable = src.seek(SeekFrom::Current(0)).is_ok();
        Self::build(src, codec, seekable)
    }
}

impl<R: Read> Iterator for StreamReader<R> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}
