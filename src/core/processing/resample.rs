use std::path::Path;

use crate::error::{Error, Result};
use crate::io::gdal::RasterEngine;
use crate::types::{SelectedBand, TempArtifact};

/// Output dimensions for re-gridding `(width, height)` from `native` pixel size to `target`.
///
/// `round(size * native / target)` per axis; `None` when either axis collapses to zero
/// or the inputs are not finite.
pub fn target_dimensions(
    width: usize,
    height: usize,
    native: (f64, f64),
    target: f64,
) -> Option<(usize, usize)> {
    let scale = |size: usize, native: f64| -> Option<usize> {
        let v = (size as f64 * native / target).round();
        if v.is_finite() && v >= 1.0 { Some(v as usize) } else { None }
    };
    Some((scale(width, native.0)?, scale(height, native.1)?))
}

/// Name of the temp artifact for `source` inside the scene temp directory.
pub fn artifact_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "band".to_string());
    format!("{}_resampled.tif", stem)
}

/// Resample one selected band to `target_resolution` into `temp_dir`.
pub fn resample_band<E: RasterEngine + ?Sized>(
    engine: &E,
    band: &SelectedBand,
    target_resolution: f64,
    temp_dir: &Path,
    creation_options: &[String],
) -> Result<TempArtifact> {
    let fail = |reason: String| Error::BandResample {
        band: band.code.clone(),
        path: band.path.clone(),
        reason,
    };

    let info = engine
        .raster_info(&band.path)
        .map_err(|e| fail(e.to_string()))?;
    let (width, height) = target_dimensions(
        info.width,
        info.height,
        (info.pixel_width, info.pixel_height),
        target_resolution,
    )
    .ok_or_else(|| {
        fail(format!(
            "degenerate geometry: {}x{} at {}/{} -> {}",
            info.width, info.height, info.pixel_width, info.pixel_height, target_resolution
        ))
    })?;

    let dst = temp_dir.join(artifact_name(&band.path));
    engine
        .resample(&band.path, &dst, (width, height), creation_options)
        .map_err(|e| fail(e.to_string()))?;

    Ok(TempArtifact {
        code: band.code.clone(),
        path: dst,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_converge_on_target_grid() {
        assert_eq!(target_dimensions(10980, 10980, (10.0, 10.0), 10.0), Some((10980, 10980)));
        assert_eq!(target_dimensions(5490, 5490, (20.0, 20.0), 10.0), Some((10980, 10980)));
        assert_eq!(target_dimensions(1830, 1830, (60.0, 60.0), 10.0), Some((10980, 10980)));
    }

    #[test]
    fn rounds_to_nearest_pixel() {
        // 7 * 15 / 10 = 10.5 -> 11, 3 * 15 / 10 = 4.5 -> 5
        assert_eq!(target_dimensions(7, 3, (15.0, 15.0), 10.0), Some((11, 5)));
        assert_eq!(target_dimensions(3, 3, (10.0, 10.0), 60.0), Some((1, 1)));
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        assert_eq!(target_dimensions(2, 2, (10.0, 10.0), 60.0), None);
        assert_eq!(target_dimensions(0, 10, (10.0, 10.0), 10.0), None);
        assert_eq!(target_dimensions(10, 10, (0.0, 10.0), 10.0), None);
    }

    #[test]
    fn artifact_names_follow_source_stem() {
        assert_eq!(
            artifact_name(Path::new("/in/R20m/T36TWN_20240115T083251_B05_20m.jp2")),
            "T36TWN_20240115T083251_B05_20m_resampled.tif"
        );
    }
}
