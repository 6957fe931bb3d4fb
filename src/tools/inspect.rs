use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::stream::StreamReader;
use crate::types::{Packet, Profile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelStats {
    pub groups: usize,
    pub frames: usize,
    pub silent_frames: usize,
}

/// Summary of a whole stream.
#[derive(Debug, Clone, Default)]
pub struct StreamSummary {
    pub seekable: bool,
    pub bytes: u64,
    pub profiles: Vec<Arc<Profile>>,
    pub labels: BTreeMap<String, LabelStats>,
}

impl StreamSummary {
    pub fn total_frames(&self) -> usize {
        self.labels.values().map(|stats| stats.frames).sum()
    }
}

pub fn summarize<R: Read>(mut reader: StreamReader<R>) -> Result<StreamSummary> {
    let mut summary = StreamSummary {
        seekable: reader.is_seekable(),
        ..StreamSummary::default()
    };

    while let Some(packet) = reader.next_packet().context("failed to decode stream")? {
        match packet {
            Packet::Profile(profile) => {
                info!(
                    "profile {}: {} Hz, frame length {} samples, spacing {} samples, {} bands, {} bins",
                    profile.seq,
                    profile.sample_rate,
                    profile.frame_length,
                    profile.frame_spacing,
                    profile.band_count,
                    profile.bin_count
                );
                summary.profiles.push(profile);
            }
            Packet::GroupHeader(group) => {
                summary.labels.entry(group.label.clone()).or_default().groups += 1;
            }
            Packet::Frame(frame) => {
                let stats = summary.labels.entry(frame.label().to_string()).or_default();
                stats.frames += 1;
                if frame.is_silent() {
                    stats.silent_frames += 1;
                }
            }
        }
    }
    summary.bytes = reader.position();
    Ok(summary)
}

impl Display for StreamSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} bytes, {} profiles, {} frames ({})",
            self.bytes,
            self.profiles.len(),
            self.total_frames(),
            if self.seekable { "seekable" } else { "sequential" }
        )?;
        for profile in &self.profiles {
            let edges: Vec<String> = profile
                .band_freqs
                .iter()
                .map(|freq| format!("{:.1}", freq))
                .collect();
            writeln!(
                f,
                "profile {}: {} Hz, threshold {:.1} dB, band edges [{}] Hz",
                profile.seq,
                profile.sample_rate,
                profile.silence_threshold,
                edges.join(", ")
            )?;
        }
        for (label, stats) in &self.labels {
            writeln!(
                f,
                "{}\t{} groups\t{} frames\t{} silent",
                label, stats.groups, stats.frames, stats.silent_frames
            )?;
        }
        Ok(())
    }
}
