use std::fmt::{Display, Formatter};
use std::ops::Range;
use std::str::FromStr;
use std::sync::Arc;

use ndarray::{s, Array1, ArrayView1};

use super::basis::BasisCache;
use super::pca::PcaProjection;
use super::{FeatureError, Result};
use crate::types::Frame;

/// Coefficients kept from the DCT and wavelet outputs; index 0 is the
/// overall level and is dropped.
const COEFFICIENT_SLICE: Range<usize> = 1..11;

/// Named transforms from a frame's band powers to a classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureMode {
    /// Band powers as decoded.
    Bands,
    /// Band powers minus their own mean.
    Mels,
    /// Interior DCT-II coefficients of the band powers.
    Dcts,
    /// Interior wavelet coefficients of the band powers.
    Wvls,
    /// Projection onto precomputed principal components.
    Pca,
}

impl FeatureMode {
    pub const ALL: [FeatureMode; 5] = [
        FeatureMode::Bands,
        FeatureMode::Mels,
        FeatureMode::Dcts,
        FeatureMode::Wvls,
        FeatureMode::Pca,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureMode::Bands => "bands",
            FeatureMode::Mels => "mels",
            FeatureMode::Dcts => "dcts",
            FeatureMode::Wvls => "wvls",
            FeatureMode::Pca => "pca",
        }
    }
}

impl Display for FeatureMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureMode {
    type Err = FeatureError;

    fn from_str(raw: &str) -> Result<Self> {
        FeatureMode::ALL
            .into_iter()
            .find(|mode| mode.name() == raw)
            .ok_or_else(|| FeatureError::UnrecognizedMode(raw.to_string()))
    }
}

/// Turns frames into fixed-length feature vectors for one mode.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    mode: FeatureMode,
    cache: Arc<BasisCache>,
    projection: Option<Arc<PcaProjection>>,
}

impl FeatureExtractor {
    /// `projection` is required for [`FeatureMode::Pca`] and ignored otherwise.
    pub fn new(
        mode: FeatureMode,
        cache: Arc<BasisCache>,
        projection: Option<Arc<PcaProjection>>,
    ) -> Result<Self> {
        if mode == FeatureMode::Pca && projection.is_none() {
            return Err(FeatureError::MissingProjection);
        }
        Ok(Self {
            mode,
            cache,
            projection,
        })
    }

    /// Parse `name` and build an extractor for it.
    pub fn for_mode(
        name: &str,
        cache: Arc<BasisCache>,
        projection: Option<Arc<PcaProjection>>,
    ) -> Result<Self> {
        Self::new(name.parse()?, cache, projection)
    }

    pub fn mode(&self) -> FeatureMode {
        self.mode
    }

    pub fn extract(&self, frame: &Frame) -> Result<Array1<f32>> {
        self.extract_bands(ArrayView1::from(frame.band_powers.as_slice()))
    }

    /// Same as [`extract`](Self::extract) for a bare band-power vector.
    pub fn extract_bands(&self, bands: ArrayView1<'_, f32>) -> Result<Array1<f32>> {
        let n = bands.len();
        let features = match self.mode {
            FeatureMode::Bands => bands.to_owned(),
            FeatureMode::Mels => {
                let mean = bands.mean().unwrap_or(0.0);
                bands.mapv(|power| power - mean)
            }
            FeatureMode::Dcts => interior(self.cache.dct(n).dot(&bands)),
            FeatureMode::Wvls => interior(self.cache.wavelet(n).dot(&bands)),
            FeatureMode::Pca => self
                .projection
                .as_ref()
                .ok_or(FeatureError::MissingProjection)?
                .project(bands)?,
        };
        Ok(features)
    }
}

fn interior(coefficients: Array1<f32>) -> Array1<f32> {
    let end = COEFFICIENT_SLICE.end.min(coefficients.len());
    let start = COEFFICIENT_SLICE.start.min(end);
    coefficients.slice(s![start..end]).to_owned()
}
