//! Core packet types for the melframe feature stream

use std::sync::Arc;

use crate::stream::{Result, StreamError};

/// Frames whose band powers all sit within this many dB of the profile's
/// silence threshold are considered silent.
pub const SILENCE_NOISE_DB: f32 = 10.0;

/// Wire tag identifying each packet kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Profile,
    GroupHeader,
    Frame,
}

impl PacketKind {
    pub const fn tag(self) -> u8 {
        match self {
            PacketKind::Profile => 1,
            PacketKind::GroupHeader => 2,
            PacketKind::Frame => 3,
        }
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(PacketKind::Profile),
            2 => Some(PacketKind::GroupHeader),
            3 => Some(PacketKind::Frame),
            _ => None,
        }
    }
}

/// Front-end configuration shared by every packet until the next profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub seq: u32,
    /// Analysis window length in samples
    pub frame_length: u16,
    /// Hop between successive frames in samples
    pub frame_spacing: u16,
    pub sample_rate: u16,
    /// Power floor in dB applied by the front end before taking logs
    pub silence_threshold: f32,
    pub band_count: u8,
    pub bin_count: u16,
    /// Band edge table: lower edge, `band_count` centers, upper edge
    pub band_freqs: Vec<f32>,
    pub bin_freqs: Vec<f32>,
}

impl Profile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seq: u32,
        frame_length: u16,
        frame_spacing: u16,
        sample_rate: u16,
        silence_threshold: f32,
        band_freqs: Vec<f32>,
        bin_freqs: Vec<f32>,
    ) -> Result<Self> {
        let band_count = band_freqs
            .len()
            .checked_sub(2)
            .and_then(|count| u8::try_from(count).ok())
            .ok_or_else(|| {
                StreamError::invalid(format!(
                    "band edge table must hold 2..=257 entries, got {}",
                    band_freqs.len()
                ))
            })?;
        let bin_count = u16::try_from(bin_freqs.len()).map_err(|_| {
            StreamError::invalid(format!("too many wideband bins: {}", bin_freqs.len()))
        })?;
        Ok(Self {
            seq,
            frame_length,
            frame_spacing,
            sample_rate,
            silence_threshold,
            band_count,
            bin_count,
            band_freqs,
            bin_freqs,
        })
    }

    /// Center frequencies of the bands, without the outer edges.
    pub fn band_centers(&self) -> &[f32] {
        let end = self.band_freqs.len().saturating_sub(1);
        self.band_freqs.get(1..end).unwrap_or(&[])
    }
}

/// Start of a labelled segment of frames from one source recording.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupHeader {
    pub seq: u32,
    pub profile: Arc<Profile>,
    pub source: String,
    pub label: String,
    /// Absolute sample position of the first frame in the source recording
    pub start_offset: i32,
}

impl GroupHeader {
    pub fn new(
        seq: u32,
        profile: Arc<Profile>,
        source: impl Into<String>,
        label: impl Into<String>,
        start_offset: i32,
    ) -> Result<Self> {
        let source = source.into();
        let label = label.into();
        for (name, value) in [("source", &source), ("label", &label)] {
            if value.len() > u8::MAX as usize {
                return Err(StreamError::invalid(format!(
                    "group {} is {} bytes long, limit is 255",
                    name,
                    value.len()
                )));
            }
        }
        Ok(Self {
            seq,
            profile,
            source,
            label,
            start_offset,
        })
    }
}

/// One analysis window of feature data.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub seq: u32,
    pub group: Arc<GroupHeader>,
    pub band_powers: Vec<f32>,
    pub bin_powers: Vec<f32>,
    /// Derived coefficient vectors, each `band_count` long
    pub coefficients: Vec<Vec<f32>>,
    pub sample_offset: i64,
}

impl Frame {
    pub fn new(
        seq: u32,
        group: Arc<GroupHeader>,
        band_powers: Vec<f32>,
        bin_powers: Vec<f32>,
        coefficients: Vec<Vec<f32>>,
        sample_offset: i64,
    ) -> Result<Self> {
        let frame = Self {
            seq,
            group,
            band_powers,
            bin_powers,
            coefficients,
            sample_offset,
        };
        frame.check_dimensions()?;
        Ok(frame)
    }

    pub fn profile(&self) -> &Arc<Profile> {
        &self.group.profile
    }

    pub fn label(&self) -> &str {
        &self.group.label
    }

    /// True when no band rises above the silence noise floor.
    pub fn is_silent(&self) -> bool {
        let ceiling = self.profile().silence_threshold + SILENCE_NOISE_DB;
        self.band_powers.iter().all(|&power| power < ceiling)
    }

    pub(crate) fn check_dimensions(&self) -> Result<()> {
        let profile = self.profile();
        let bands = profile.band_count as usize;
        if self.band_powers.len() != bands {
            return Err(StreamError::invalid(format!(
                "frame has {} band powers, profile declares {}",
                self.band_powers.len(),
                bands
            )));
        }
        if self.bin_powers.len() != profile.bin_count as usize {
            return Err(StreamError::invalid(format!(
                "frame has {} bin powers, profile declares {}",
                self.bin_powers.len(),
                profile.bin_count
            )));
        }
        if let Some(set) = self.coefficients.iter().find(|set| set.len() != bands) {
            return Err(StreamError::invalid(format!(
                "coefficient vector has {} entries, profile declares {} bands",
                set.len(),
                bands
            )));
        }
        Ok(())
    }
}

/// A decoded stream element.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Profile(Arc<Profile>),
    GroupHeader(Arc<GroupHeader>),
    Frame(Frame),
}

impl Packet {
    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::Profile(_) => PacketKind::Profile,
            Packet::GroupHeader(_) => PacketKind::GroupHeader,
            Packet::Frame(_) => PacketKind::Frame,
        }
    }
}

impl From<Frame> for Packet {
    fn from(frame: Frame) -> Self {
        Packet::Frame(frame)
    }
}

impl From<Arc<GroupHeader>> for Packet {
    fn from(group: Arc<GroupHeader>) -> Self {
        Packet::GroupHeader(group)
    }
}

impl From<Arc<Profile>> for Packet {
    fn from(profile: Arc<Profile>) -> Self {
        Packet::Profile(profile)
    }
}

/// How many floats a frame carries beyond its band and bin powers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Number of derived coefficient vectors, each `band_count` long
    pub coefficient_sets: usize,
}

impl FrameLayout {
    pub const fn new(coefficient_sets: usize) -> Self {
        Self { coefficient_sets }
    }

    /// Number of f32 values in a frame payload under `profile`.
    pub fn frame_floats(&self, profile: &Profile) -> usize {
        let bands = profile.band_count as usize;
        bands + profile.bin_count as usize + self.coefficient_sets * bands
    }
}

impl Default for FrameLayout {
    /// DCT coefficients followed by wavelet coefficients.
    fn default() -> Self {
        Self::new(2)
    }
}
