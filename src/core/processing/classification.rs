use std::fs;
use std::path::{Path, PathBuf};

use crate::core::params::PipelineConfig;
use crate::core::processing::composite::{publish, staged_path};
use crate::error::{Error, Result};
use crate::io::gdal::RasterEngine;
use crate::types::{CLASSIFICATION_CODE, SceneId, TempArtifact};

/// `<tile-id>_<timestamp>_SCL.<ext>`
pub fn classification_file_name(scene: &SceneId, extension: &str) -> String {
    format!("{}_{}.{}", scene.stem(), CLASSIFICATION_CODE, extension)
}

/// Materialize the classification layer on its own at `final_path`.
///
/// Same creation options as the composite, no statistics and no overviews.
/// Staged in `temp_dir` and renamed into place like the composite.
pub fn export_classification<E: RasterEngine + ?Sized>(
    engine: &E,
    artifact: &TempArtifact,
    temp_dir: &Path,
    final_path: &Path,
    config: &PipelineConfig,
) -> Result<PathBuf> {
    let fail = |reason: String| Error::ClassificationExport {
        path: final_path.to_path_buf(),
        reason,
    };

    if let Some(parent) = final_path.parent() {
        fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
    }
    let staged = staged_path(temp_dir, final_path);
    engine
        .materialize(&artifact.path, &staged, &config.creation_options, false)
        .map_err(|e| fail(e.to_string()))?;
    publish(&staged, final_path, config.cleanup_policy()).map_err(|e| fail(format!("publish: {}", e)))?;
    Ok(final_path.to_path_buf())
}
