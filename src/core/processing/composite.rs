use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::params::PipelineConfig;
use crate::error::{Error, Result};
use crate::io::gdal::{BandAnnotation, RasterEngine};
use crate::io::retry::{RetryPolicy, is_transient_io, retry};
use crate::types::{BAND_TABLE, BandSpec, ColorRole, TempArtifact};

/// Name of the virtual stack inside the scene temp directory.
pub const STACK_NAME: &str = "stack.vrt";

/// A materialized multi-band composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composite {
    pub path: PathBuf,
    /// Band codes in output order
    pub bands: Vec<String>,
    /// 1-based band index and role for every band carrying a color role
    pub roles: Vec<(usize, ColorRole)>,
}

/// Priority table rows whose code is present, in table order.
pub fn order_bands<'a, I>(codes: I) -> Vec<&'static BandSpec>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = codes.into_iter().collect();
    BAND_TABLE
        .iter()
        .filter(|spec| present.contains(&spec.code))
        .collect()
}

/// Band descriptions and color roles for an ordered band list.
pub fn annotations(order: &[&BandSpec]) -> Vec<BandAnnotation> {
    order
        .iter()
        .enumerate()
        .map(|(i, spec)| BandAnnotation {
            index: i + 1,
            description: spec.code.to_string(),
            role: spec.role,
        })
        .collect()
}

/// Path of the not-yet-published copy of `final_path` inside `temp_dir`.
pub fn staged_path(temp_dir: &Path, final_path: &Path) -> PathBuf {
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    temp_dir.join(format!("{}.partial", name))
}

/// Move a staged file to `final_path` atomically.
///
/// A plain rename when both live on the same filesystem; otherwise the file is
/// copied next to `final_path` first and renamed from there. Renames blocked by
/// a concurrent reader are retried under `policy`.
pub fn publish(staged: &Path, final_path: &Path, policy: RetryPolicy) -> std::io::Result<()> {
    let rename = |from: &Path| retry(policy, is_transient_io, || fs::rename(from, final_path));
    match rename(staged) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            let name = final_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let sibling = final_path.with_file_name(format!(".{}.partial", name));
            if fs::copy(staged, &sibling).is_err() {
                let _ = fs::remove_file(&sibling);
                return Err(rename_err);
            }
            rename(&sibling).inspect_err(|_| {
                let _ = fs::remove_file(&sibling);
            })?;
            fs::remove_file(staged).or(Ok(()))
        }
    }
}

/// Stack `artifacts` in priority order and materialize them at `final_path`.
///
/// The output is written to a staged file in `temp_dir` and renamed into place
/// only after materialization and annotation succeed, so `final_path` either
/// holds a complete composite or does not appear.
pub fn build_composite<E: RasterEngine + ?Sized>(
    engine: &E,
    scene: &str,
    artifacts: &BTreeMap<String, TempArtifact>,
    temp_dir: &Path,
    final_path: &Path,
    config: &PipelineConfig,
) -> Result<Composite> {
    let order = order_bands(artifacts.keys().map(String::as_str));
    if order.is_empty() {
        return Err(Error::NoValidBands {
            scene: scene.to_string(),
        });
    }

    let fail = |reason: String| Error::CompositeWrite {
        path: final_path.to_path_buf(),
        reason,
    };

    let sources: Vec<PathBuf> = order
        .iter()
        .filter_map(|spec| artifacts.get(spec.code))
        .map(|a| a.path.clone())
        .collect();

    let stack = temp_dir.join(STACK_NAME);
    engine
        .build_stack(&sources, &stack)
        .map_err(|e| fail(format!("virtual stack: {}", e)))?;

    let staged = staged_path(temp_dir, final_path);
    engine
        .materialize(&stack, &staged, &config.creation_options, true)
        .map_err(|e| fail(e.to_string()))?;

    let notes = annotations(&order);
    engine
        .annotate_bands(&staged, &notes)
        .map_err(|e| fail(format!("band metadata: {}", e)))?;

    publish(&staged, final_path, config.cleanup_policy()).map_err(|e| fail(format!("publish: {}", e)))?;
    debug!("composite published: {:?}", final_path);

    Ok(Composite {
        path: final_path.to_path_buf(),
        bands: order.iter().map(|s| s.code.to_string()).collect(),
        roles: notes
            .iter()
            .filter_map(|n| n.role.map(|r| (n.index, r)))
            .collect(),
    })
}
