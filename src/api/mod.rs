//! High-level, ergonomic library API: process one scene directory or a whole
//! extraction tree into composites and classification layers. Prefer these
//! entrypoints over the low-level stage functions when integrating s2stack.
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::params::PipelineConfig;
use crate::core::processing::pipeline::{SceneOutcome, ScenePipeline, SceneTargets};
use crate::error::{Error, Result};
use crate::io::gdal::{GdalEngine, RasterEngine};
use crate::io::locator::{SceneDir, SceneLocator};
use crate::report::{Reporter, TracingReporter};

/// Batch processing report
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub errors: usize,
    /// Outcome of every scene that produced a composite, in discovery order
    pub outcomes: Vec<SceneOutcome>,
    /// Scene directories that failed, with the error message
    pub failures: Vec<(PathBuf, String)>,
}

/// Return the scene directories under `input_root` in deterministic order
pub fn iterate_scenes(input_root: &Path) -> Result<std::vec::IntoIter<SceneDir>> {
    Ok(SceneLocator::new(input_root).scenes()?.into_iter())
}

/// Process one scene directory; outputs mirror `relative` below both output roots.
pub fn process_scene<E, R>(
    engine: &E,
    reporter: &R,
    config: &PipelineConfig,
    scene_dir: &Path,
    relative: &Path,
    output_root: &Path,
    scl_output_root: &Path,
) -> Result<SceneOutcome>
where
    E: RasterEngine + ?Sized,
    R: Reporter + ?Sized,
{
    config.validate()?;
    let targets = SceneTargets::mirrored(output_root, scl_output_root, relative);
    ScenePipeline::new(engine, reporter, config).run(scene_dir, &targets)
}

/// Process every scene under `input_root`.
///
/// Discovery problems (missing root, no scenes) are returned as errors. Scene
/// failures are counted in the report; with `continue_on_error == false` the
/// first one is returned instead.
pub fn process_tree<E, R>(
    engine: &E,
    reporter: &R,
    config: &PipelineConfig,
    input_root: &Path,
    output_root: &Path,
    scl_output_root: &Path,
    continue_on_error: bool,
) -> Result<BatchReport>
where
    E: RasterEngine + ?Sized,
    R: Reporter + ?Sized,
{
    config.validate()?;
    let scenes = iterate_scenes(input_root)?;
    fs::create_dir_all(output_root).map_err(Error::from)?;
    fs::create_dir_all(scl_output_root).map_err(Error::from)?;

    let pipeline = ScenePipeline::new(engine, reporter, config);
    let mut report = BatchReport::default();
    for scene in scenes {
        let targets = SceneTargets::mirrored(output_root, scl_output_root, &scene.relative);
        match pipeline.run(&scene.path, &targets) {
            Ok(outcome) => {
                report.processed += 1;
                report.outcomes.push(outcome);
            }
            Err(e) => {
                report.errors += 1;
                if !continue_on_error {
                    return Err(e);
                }
                report.failures.push((scene.path, e.to_string()));
            }
        }
    }
    Ok(report)
}

/// [`process_tree`] with the GDAL engine, `tracing` reporting, and continue-on-error.
pub fn process_tree_to_path(
    input_root: &Path,
    output_root: &Path,
    scl_output_root: &Path,
    config: &PipelineConfig,
) -> Result<BatchReport> {
    process_tree(
        &GdalEngine::default(),
        &TracingReporter,
        config,
        input_root,
        output_root,
        scl_output_root,
        true,
    )
}
