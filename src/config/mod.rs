use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::stream::{ByteOrder, PacketCodec};
use crate::transform::PcaProjection;
use crate::types::FrameLayout;

const MAX_COEFFICIENT_SETS: usize = 8;

/// Stream and transform settings, read from an optional JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
    pub byte_order: ByteOrder,
    /// Derived coefficient vectors carried by every frame
    pub coefficient_sets: usize,
    pub pca_projection: Option<PathBuf>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::Little,
            coefficient_sets: FrameLayout::default().coefficient_sets,
            pca_projection: None,
        }
    }
}

impl StreamConfig {
    /// Load `path` if given, defaults otherwise.
    pub fn from_override(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let mut config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {:?}", path))?;
        // Relative resource paths are taken relative to the config file.
        if let (Some(projection), Some(dir)) = (&config.pca_projection, path.parent()) {
            if projection.is_relative() {
                config.pca_projection = Some(dir.join(projection));
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.coefficient_sets <= MAX_COEFFICIENT_SETS,
            "coefficient_sets must be at most {}, got {}",
            MAX_COEFFICIENT_SETS,
            self.coefficient_sets
        );
        Ok(())
    }

    pub fn frame_layout(&self) -> FrameLayout {
        FrameLayout::new(self.coefficient_sets)
    }

    pub fn codec(&self) -> PacketCodec {
        PacketCodec::new(self.byte_order, self.frame_layout())
    }

    /// Load the configured PCA projection, if any.
    pub fn projection(&self) -> Result<Option<Arc<PcaProjection>>> {
        self.pca_projection
            .as_deref()
            .map(|path| {
                PcaProjection::load(path)
                    .map(Arc::new)
                    .with_context(|| format!("failed to load PCA projection {:?}", path))
            })
            .transpose()
    }
}
