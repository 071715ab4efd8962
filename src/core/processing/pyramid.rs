use std::path::Path;

use crate::core::params::PipelineConfig;
use crate::error::{Error, Result};
use crate::io::gdal::RasterEngine;

/// Build the configured overview levels on `path` in place.
///
/// Uses the configured resampling (nearest by default) so that overview pixels
/// are always values present in the full-resolution band.
pub fn build_pyramids<E: RasterEngine + ?Sized>(
    engine: &E,
    path: &Path,
    config: &PipelineConfig,
) -> Result<()> {
    if config.overview_levels.is_empty() {
        return Ok(());
    }
    engine
        .build_overviews(path, &config.overview_resampling, &config.overview_levels)
        .map_err(|e| Error::PyramidBuild {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
