//! Feature transforms applied to decoded frames.

pub mod basis;
pub mod extractor;
pub mod lifting;
pub mod pca;

use thiserror::Error;

pub use basis::BasisCache;
pub use extractor::{FeatureExtractor, FeatureMode};
pub use pca::PcaProjection;

/// Errors raised while configuring or running feature extraction.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("unrecognized feature mode '{0}'; expected one of bands, mels, dcts, wvls, pca")]
    UnrecognizedMode(String),

    #[error("pca mode needs a projection resource")]
    MissingProjection,

    #[error("projection expects {expected} bands, frame has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid projection: {0}")]
    InvalidProjection(String),

    #[error("failed to read projection resource")]
    Io(#[from] std::io::Error),

    #[error("failed to parse projection resource")]
    Json(#[from] serde_json::Error),
}

/// Convenient alias for results returned by transform modules.
pub type Result<T> = std::result::Result<T, FeatureError>;
