//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O errors; raster engine failures are carried by the
//! semantic variants for the per-band and per-scene failures of the pipeline.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Input root does not exist: {0}")]
    MissingInput(PathBuf),

    #[error("No scene directories with band rasters found under {0}")]
    NoScenes(PathBuf),

    #[error("Failed to resample band {band} from {path}: {reason}")]
    BandResample {
        band: String,
        path: PathBuf,
        reason: String,
    },

    #[error("No valid bands for scene {scene}")]
    NoValidBands { scene: String },

    #[error("Failed to write composite {path}: {reason}")]
    CompositeWrite { path: PathBuf, reason: String },

    #[error("Failed to build overviews for {path}: {reason}")]
    PyramidBuild { path: PathBuf, reason: String },

    #[error("Failed to export classification layer {path}: {reason}")]
    ClassificationExport { path: PathBuf, reason: String },
}

impl Error {
    pub fn invalid<V: std::fmt::Display>(arg: &'static str, value: V) -> Self {
        Error::InvalidArgument {
            arg,
            value: value.to_string(),
        }
    }
}
