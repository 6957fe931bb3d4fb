use std::io::{Read, Write};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::info;

use crate::stream::{StreamReader, StreamWriter};
use crate::types::Packet;

/// Selects groups by source and label.
#[derive(Debug, Clone)]
pub struct GroupFilter {
    source: Regex,
    label: Regex,
}

impl GroupFilter {
    pub fn new(source: &str, label: &str) -> Result<Self> {
        Ok(Self {
            source: anchored(source)?,
            label: anchored(label)?,
        })
    }

    pub fn accepts(&self, source: &str, label: &str) -> bool {
        self.source.is_match(source) && self.label.is_match(label)
    }
}

/// Patterns match from the start of the field.
fn anchored(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})", pattern))
        .with_context(|| format!("invalid pattern '{}'", pattern))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub groups_kept: usize,
    pub groups_dropped: usize,
    pub frames_kept: usize,
}

/// Copy profiles unconditionally and accepted groups with their frames.
pub fn filter_groups<R: Read, W: Write>(
    reader: &mut StreamReader<R>,
    writer: &mut StreamWriter<W>,
    filter: &GroupFilter,
) -> Result<FilterStats> {
    let mut stats = FilterStats::default();
    let mut accept = true;

    while let Some(packet) = reader.next_packet().context("failed to decode stream")? {
        match &packet {
            Packet::Profile(_) => {}
            Packet::GroupHeader(group) => {
                accept = filter.accepts(&group.source, &group.label);
                if accept {
                    info!("matched source {}, label {}", group.source, group.label);
                    stats.groups_kept += 1;
                } else {
                    stats.groups_dropped += 1;
                }
            }
            Packet::Frame(_) if accept => stats.frames_kept += 1,
            Packet::Frame(_) => continue,
        }
        if accept || matches!(packet, Packet::Profile(_)) {
            writer.write(&packet).context("failed to write stream")?;
        }
    }
    writer.flush().context("failed to flush stream")?;
    Ok(stats)
}
