use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::catalog::BandCatalog;
use crate::core::params::PipelineConfig;
use crate::core::processing::classification::{classification_file_name, export_classification};
use crate::core::processing::composite::build_composite;
use crate::core::processing::pyramid::build_pyramids;
use crate::core::processing::resample::resample_band;
use crate::core::reconcile::{Reconciliation, reconcile};
use crate::error::{Error, Result};
use crate::io::gdal::RasterEngine;
use crate::io::janitor::{CleanupReport, Janitor};
use crate::report::{Event, Reporter};
use crate::types::{SceneId, SceneStage, TempArtifact};

/// What one successful scene run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneOutcome {
    pub scene: SceneId,
    pub composite: PathBuf,
    /// Composite band codes in output order
    pub bands: Vec<String>,
    /// Selected bands that failed to resample and were left out
    pub dropped_bands: Vec<String>,
    pub overviews_built: bool,
    pub classification: Option<PathBuf>,
    pub cleanup: CleanupReport,
    /// Last state the scene reached
    pub stage: SceneStage,
}

/// Where a scene's outputs go
#[derive(Debug, Clone)]
pub struct SceneTargets {
    /// Directory receiving the composite (`<output-root>/<relative-scene-path>`)
    pub output_dir: PathBuf,
    /// Directory receiving the classification layer (`<scl-output-root>/<relative-scene-path>`)
    pub scl_output_dir: PathBuf,
}

impl SceneTargets {
    pub fn mirrored(output_root: &Path, scl_output_root: &Path, relative: &Path) -> Self {
        Self {
            output_dir: output_root.join(relative),
            scl_output_dir: scl_output_root.join(relative),
        }
    }

    /// Exclusive temp directory for one scene, next to its composite.
    pub fn temp_dir(&self, scene: &SceneId) -> PathBuf {
        self.output_dir.join(format!(".{}.tmp", scene.stem()))
    }
}

// Outermost not-yet-existing directory on the way to `dir`, inclusive.
fn first_missing_ancestor(dir: &Path) -> Option<PathBuf> {
    let mut missing = None;
    for ancestor in dir.ancestors() {
        if ancestor.as_os_str().is_empty() || ancestor.exists() {
            break;
        }
        missing = Some(ancestor.to_path_buf());
    }
    missing
}

// Remove `dir` and its parents up to `top` for as long as they are empty.
fn prune_empty_dirs(dir: &Path, top: &Path) {
    for ancestor in dir.ancestors() {
        if fs::remove_dir(ancestor).is_err() || ancestor == top {
            break;
        }
    }
}

/// Per-scene composite pipeline over an injected raster engine and reporter.
pub struct ScenePipeline<'a, E: RasterEngine + ?Sized, R: Reporter + ?Sized> {
    pub engine: &'a E,
    pub reporter: &'a R,
    pub config: &'a PipelineConfig,
}

struct StageOutputs {
    composite: PathBuf,
    bands: Vec<String>,
    dropped_bands: Vec<String>,
    overviews_built: bool,
    classification: Option<PathBuf>,
}

impl<'a, E: RasterEngine + ?Sized, R: Reporter + ?Sized> ScenePipeline<'a, E, R> {
    pub fn new(engine: &'a E, reporter: &'a R, config: &'a PipelineConfig) -> Self {
        Self {
            engine,
            reporter,
            config,
        }
    }

    /// Run every stage for the scene in `scene_dir`.
    ///
    /// The scene temp directory is swept whether the stages succeed or fail.
    pub fn run(&self, scene_dir: &Path, targets: &SceneTargets) -> Result<SceneOutcome> {
        let label = scene_dir.display().to_string();
        self.reporter.record(Event::SceneDiscovered, &label, "");

        let catalog = BandCatalog::scan(scene_dir, &label, self.reporter)
            .inspect_err(|e| self.fail(&label, SceneStage::Discovered, e))?;
        let scene = match catalog.scene.clone() {
            Some(s) => s,
            None => {
                let err = Error::NoValidBands { scene: label.clone() };
                self.fail(&label, SceneStage::BandsEnumerated, &err);
                return Err(err);
            }
        };
        let scene_label = scene.to_string();
        let reconciled = reconcile(&catalog, self.config, self.reporter);

        let temp_dir = targets.temp_dir(&scene);
        let janitor = Janitor::new(self.config.cleanup_policy(), self.reporter, scene_label.as_str());

        let created = first_missing_ancestor(&targets.output_dir);
        let mut stage = SceneStage::Reconciled;
        let result = self.run_stages(&scene, &reconciled, targets, &temp_dir, &mut stage);
        let cleanup = janitor.sweep(&temp_dir);
        // A failed scene leaves no empty mirror of its path behind.
        if let (Err(_), Some(top)) = (&result, &created) {
            prune_empty_dirs(&targets.output_dir, top);
        }

        match result {
            Ok(out) => {
                self.reporter.record(
                    Event::SceneCompleted,
                    &scene_label,
                    &format!("{} bands -> {}", out.bands.len(), out.composite.display()),
                );
                Ok(SceneOutcome {
                    scene,
                    composite: out.composite,
                    bands: out.bands,
                    dropped_bands: out.dropped_bands,
                    overviews_built: out.overviews_built,
                    classification: out.classification,
                    cleanup,
                    stage: SceneStage::CleanedUp,
                })
            }
            Err(e) => {
                self.fail(&scene_label, stage, &e);
                Err(e)
            }
        }
    }

    fn fail(&self, scene: &str, stage: SceneStage, err: &Error) {
        self.reporter
            .record(Event::SceneFailed, scene, &format!("failed after {}: {}", stage, err));
    }

    fn run_stages(
        &self,
        scene: &SceneId,
        reconciled: &Reconciliation,
        targets: &SceneTargets,
        temp_dir: &Path,
        stage: &mut SceneStage,
    ) -> Result<StageOutputs> {
        let label = scene.to_string();
        let config = self.config;

        fs::create_dir_all(&targets.output_dir)?;
        // A leftover from an interrupted run would otherwise leak into this one.
        if temp_dir.exists() {
            Janitor::new(config.cleanup_policy(), self.reporter, label.as_str()).sweep(temp_dir);
        }
        fs::create_dir_all(temp_dir)?;

        let mut artifacts: BTreeMap<String, TempArtifact> = BTreeMap::new();
        let mut dropped_bands = Vec::new();
        for band in reconciled.bands.values() {
            match resample_band(
                self.engine,
                band,
                config.target_resolution,
                temp_dir,
                &config.creation_options,
            ) {
                Ok(artifact) => {
                    self.reporter.record(
                        Event::BandResampled,
                        &label,
                        &format!("{} -> {}x{}", band.code, artifact.width, artifact.height),
                    );
                    artifacts.insert(band.code.clone(), artifact);
                }
                Err(e) => {
                    self.reporter.record(Event::BandResampleFailed, &label, &e.to_string());
                    dropped_bands.push(band.code.clone());
                }
            }
        }

        let classification_artifact = match &reconciled.classification {
            Some(band) => match resample_band(
                self.engine,
                band,
                config.target_resolution,
                temp_dir,
                &config.creation_options,
            ) {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    self.reporter.record(Event::ClassificationFailed, &label, &e.to_string());
                    None
                }
            },
            None => None,
        };
        *stage = SceneStage::Resampled;

        let composite_path = targets
            .output_dir
            .join(format!("{}.{}", scene.stem(), config.output_extension));
        let composite = build_composite(self.engine, &label, &artifacts, temp_dir, &composite_path, config)
            .inspect_err(|e| self.reporter.record(Event::CompositeFailed, &label, &e.to_string()))?;
        self.reporter.record(
            Event::CompositeWritten,
            &label,
            &format!("{} [{}]", composite.path.display(), composite.bands.join(",")),
        );
        *stage = SceneStage::Composited;

        let overviews_built = match build_pyramids(self.engine, &composite.path, config) {
            Ok(()) => {
                self.reporter.record(
                    Event::OverviewsBuilt,
                    &label,
                    &format!("{:?} using {}", config.overview_levels, config.overview_resampling),
                );
                true
            }
            Err(e) => {
                self.reporter.record(Event::OverviewsFailed, &label, &e.to_string());
                false
            }
        };
        *stage = SceneStage::OverviewsBuilt;

        let classification = match &classification_artifact {
            Some(artifact) => {
                let path = targets
                    .scl_output_dir
                    .join(classification_file_name(scene, &config.output_extension));
                match export_classification(self.engine, artifact, temp_dir, &path, config) {
                    Ok(p) => {
                        self.reporter
                            .record(Event::ClassificationExported, &label, &p.display().to_string());
                        Some(p)
                    }
                    Err(e) => {
                        self.reporter.record(Event::ClassificationFailed, &label, &e.to_string());
                        None
                    }
                }
            }
            None => {
                self.reporter.record(Event::ClassificationAbsent, &label, "");
                None
            }
        };
        *stage = SceneStage::ClassificationHandled;

        Ok(StageOutputs {
            composite: composite.path,
            bands: composite.bands,
            dropped_bands,
            overviews_built,
            classification,
        })
    }
}
