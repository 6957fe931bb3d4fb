use std::io::{Read, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::stream::StreamReader;
use crate::transform::FeatureExtractor;

/// One line of feature output.
#[derive(Debug, Serialize)]
pub struct FeatureRecord<'a> {
    pub label: &'a str,
    pub source: &'a str,
    pub sample_offset: i64,
    pub x: Vec<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureStats {
    pub written: usize,
    pub skipped_silent: usize,
}

/// Write one JSON line per frame with its label and feature vector.
pub fn write_features<R: Read, W: Write>(
    reader: &mut StreamReader<R>,
    extractor: &FeatureExtractor,
    skip_silent: bool,
    out: &mut W,
) -> Result<FeatureStats> {
    let mut stats = FeatureStats::default();
    while let Some(frame) = reader.next_frame().context("failed to decode stream")? {
        if skip_silent && frame.is_silent() {
            stats.skipped_silent += 1;
            continue;
        }
        let x = extractor
            .extract(&frame)
            .with_context(|| format!("failed to extract features from frame {}", frame.seq))?;
        let record = FeatureRecord {
            label: frame.label(),
            source: &frame.group.source,
            sample_offset: frame.sample_offset,
            x: x.to_vec(),
        };
        serde_json::to_writer(&mut *out, &record).context("failed to write features")?;
        out.write_all(b"\n")?;
        stats.written += 1;
    }
    out.flush()?;
    info!(
        mode = %extractor.mode(),
        written = stats.written,
        skipped = stats.skipped_silent,
        "extracted features"
    );
    Ok(stats)
}
