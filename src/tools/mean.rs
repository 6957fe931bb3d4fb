use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use ndarray::Array1;
use tracing::info;

use crate::stream::{StreamReader, StreamWriter};
use crate::types::{Frame, GroupHeader, Packet, Profile};

fn db_to_power(db: f32) -> f64 {
    10f64.powf(f64::from(db) / 10.0)
}

fn power_to_db(power: f64) -> f32 {
    (10.0 * power.log10()) as f32
}

fn accumulate(sums: &mut Array1<f64>, dbs: &[f32]) {
    for (sum, &db) in sums.iter_mut().zip(dbs) {
        *sum += db_to_power(db);
    }
}

/// Running power-domain sum of one label's frames.
#[derive(Debug)]
struct MeanBucket {
    profile: Arc<Profile>,
    band_power: Array1<f64>,
    bin_power: Array1<f64>,
    count: usize,
}

impl MeanBucket {
    fn new(frame: &Frame) -> Self {
        Self {
            profile: Arc::clone(frame.profile()),
            band_power: frame.band_powers.iter().map(|&db| db_to_power(db)).collect(),
            bin_power: frame.bin_powers.iter().map(|&db| db_to_power(db)).collect(),
            count: 1,
        }
    }

    fn add(&mut self, frame: &Frame) -> Result<()> {
        ensure!(
            frame.band_powers.len() == self.band_power.len()
                && frame.bin_powers.len() == self.bin_power.len(),
            "label '{}' mixes frames of different shapes",
            frame.label()
        );
        accumulate(&mut self.band_power, &frame.band_powers);
        accumulate(&mut self.bin_power, &frame.bin_powers);
        self.count += 1;
        Ok(())
    }

    fn mean_db(power: &Array1<f64>, count: usize) -> Vec<f32> {
        power.iter().map(|&sum| power_to_db(sum / count as f64)).collect()
    }
}

/// Average every label's frames in the power domain and write one group and
/// one frame per label, in label order.
pub fn mean_by_label<R: Read, W: Write>(
    reader: &mut StreamReader<R>,
    writer: &mut StreamWriter<W>,
) -> Result<usize> {
    let mut buckets: BTreeMap<String, MeanBucket> = BTreeMap::new();
    let mut frames = 0usize;
    while let Some(frame) = reader.next_frame().context("failed to decode stream")? {
        frames += 1;
        match buckets.get_mut(frame.label()) {
            Some(bucket) => bucket.add(&frame)?,
            None => {
                buckets.insert(frame.label().to_string(), MeanBucket::new(&frame));
            }
        }
    }
    info!(frames, labels = buckets.len(), "averaged frames");

    let coefficient_sets = writer.codec().layout.coefficient_sets;
    let mut last_profile: Option<Arc<Profile>> = None;
    for (label, bucket) in &buckets {
        if !last_profile
            .as_ref()
            .is_some_and(|written| Arc::ptr_eq(written, &bucket.profile))
        {
            writer.write(&Packet::Profile(Arc::clone(&bucket.profile)))?;
            last_profile = Some(Arc::clone(&bucket.profile));
        }
        let group = Arc::new(GroupHeader::new(
            0,
            Arc::clone(&bucket.profile),
            "",
            label.as_str(),
            0,
        )?);
        writer.write(&Packet::GroupHeader(Arc::clone(&group)))?;

        let bands = bucket.band_power.len();
        let frame = Frame::new(
            0,
            group,
            MeanBucket::mean_db(&bucket.band_power, bucket.count),
            MeanBucket::mean_db(&bucket.bin_power, bucket.count),
            vec![vec![0.0; bands]; coefficient_sets],
            0,
        )?;
        writer.write(&Packet::Frame(frame))?;
    }
    writer.flush().context("failed to flush stream")?;
    Ok(buckets.len())
}
