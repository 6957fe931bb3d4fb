use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;

use super::{FeatureError, Result};

/// Number of principal components kept when a resource does not say.
pub const DEFAULT_RETAINED: usize = 3;

#[derive(Debug, Deserialize)]
struct ProjectionFile {
    components: Vec<Vec<f32>>,
    #[serde(default = "default_retained")]
    retain: usize,
}

fn default_retained() -> usize {
    DEFAULT_RETAINED
}

/// Precomputed principal axes of band-power space.
///
/// Rows of the stored matrix are components ordered by decreasing variance;
/// any volume normalisation is expected to be folded into them already.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaProjection {
    components: Array2<f32>,
}

impl PcaProjection {
    /// Build from component rows, keeping the leading `retain` of them.
    pub fn new(components: Vec<Vec<f32>>, retain: usize) -> Result<Self> {
        let dims = components.first().map_or(0, Vec::len);
        if dims == 0 {
            return Err(FeatureError::InvalidProjection(
                "projection has no components".to_string(),
            ));
        }
        if let Some(row) = components.iter().find(|row| row.len() != dims) {
            return Err(FeatureError::InvalidProjection(format!(
                "component lengths differ: {} vs {}",
                row.len(),
                dims
            )));
        }
        if retain == 0 || retain > components.len() {
            return Err(FeatureError::InvalidProjection(format!(
                "cannot retain {} of {} components",
                retain,
                components.len()
            )));
        }

        let flat: Vec<f32> = components.into_iter().take(retain).flatten().collect();
        let components = Array2::from_shape_vec((retain, dims), flat)
            .map_err(|err| FeatureError::InvalidProjection(err.to_string()))?;
        Ok(Self { components })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let parsed: ProjectionFile = serde_json::from_reader(BufReader::new(file))?;
        Self::new(parsed.components, parsed.retain)
    }

    /// Band count the projection expects.
    pub fn dimensions(&self) -> usize {
        self.components.ncols()
    }

    pub fn retained(&self) -> usize {
        self.components.nrows()
    }

    pub fn project(&self, bands: ArrayView1<'_, f32>) -> Result<Array1<f32>> {
        if bands.len() != self.dimensions() {
            return Err(FeatureError::DimensionMismatch {
                expected: self.dimensions(),
                actual: bands.len(),
            });
        }
        Ok(self.components.dot(&bands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;

    #[test]
    fn projects_onto_leading_components() {
        let projection = PcaProjection::new(
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 1.0], vec![9.0, 9.0, 9.0]],
            2,
        )
        .unwrap();
        let out = projection.project(array![2.0, 3.0, 4.0].view()).unwrap();
        assert_eq!(out, array![2.0, 7.0]);
    }

    #[test]
    fn rejects_mismatched_band_count() {
        let projection = PcaProjection::new(vec![vec![1.0, 0.0]], 1).unwrap();
        let err = projection.project(array![1.0, 2.0, 3.0].view()).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn rejects_ragged_components() {
        assert!(PcaProjection::new(vec![vec![1.0, 0.0], vec![1.0]], 1).is_err());
        assert!(PcaProjection::new(vec![], 1).is_err());
    }

    #[test]
    fn loads_json_resource_with_default_retention() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"components": [[1, 0], [0, 1], [1, 1], [1, -1]]}}"#
        )
        .unwrap();
        let projection = PcaProjection::load(file.path()).unwrap();
        assert_eq!(projection.retained(), DEFAULT_RETAINED);
        assert_eq!(projection.dimensions(), 2);
    }
}
