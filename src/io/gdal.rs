use gdal::programs::raster::{BuildVRTOptions, build_vrt};
use gdal::raster::ColorInterpretation;
use gdal::{Dataset, DatasetOptions, GdalOpenFlags, Metadata, errors::GdalError as GdalCrateError};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

use crate::types::ColorRole;

/// Errors encountered when driving GDAL
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Tool {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("No geotransform in {0}")]
    MissingGeoTransform(PathBuf),
    #[error("Band index {index} out of range (dataset has {count} bands)")]
    BandIndex { index: usize, count: usize },
    #[error("Non-UTF-8 path: {0}")]
    Path(PathBuf),
}

/// Geometry of a single raster, as needed for resampling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterInfo {
    /// Width (pixels) of the raster
    pub width: usize,
    /// Height (lines) of the raster
    pub height: usize,
    /// Pixel width in georeferenced units (absolute value of geotransform[1])
    pub pixel_width: f64,
    /// Pixel height in georeferenced units (absolute value of geotransform[5])
    pub pixel_height: f64,
    /// Number of raster bands
    pub bands: usize,
}

/// Description and display role for one band of a written raster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandAnnotation {
    /// 1-based band index
    pub index: usize,
    pub description: String,
    pub role: Option<ColorRole>,
}

/// The raster operations the composite pipeline needs.
pub trait RasterEngine {
    /// Read size and pixel spacing from the raster's geolocation metadata.
    fn raster_info(&self, path: &Path) -> Result<RasterInfo, GdalError>;

    /// Write a nearest-neighbour resampled copy of `src` with the given `(width, height)`.
    fn resample(
        &self,
        src: &Path,
        dst: &Path,
        size: (usize, usize),
        creation_options: &[String],
    ) -> Result<(), GdalError>;

    /// Build a band-separated virtual stack referencing `sources` in order.
    fn build_stack(&self, sources: &[PathBuf], dst: &Path) -> Result<(), GdalError>;

    /// Copy `src` into a compressed GTiff at `dst`, optionally embedding band statistics.
    fn materialize(
        &self,
        src: &Path,
        dst: &Path,
        creation_options: &[String],
        compute_stats: bool,
    ) -> Result<(), GdalError>;

    fn annotate_bands(&self, path: &Path, bands: &[BandAnnotation]) -> Result<(), GdalError>;

    /// Build reduced-resolution overviews in place.
    fn build_overviews(&self, path: &Path, resampling: &str, levels: &[i32]) -> Result<(), GdalError>;
}

impl<E: RasterEngine + ?Sized> RasterEngine for &E {
    fn raster_info(&self, path: &Path) -> Result<RasterInfo, GdalError> {
        (**self).raster_info(path)
    }
    fn resample(
        &self,
        src: &Path,
        dst: &Path,
        size: (usize, usize),
        creation_options: &[String],
    ) -> Result<(), GdalError> {
        (**self).resample(src, dst, size, creation_options)
    }
    fn build_stack(&self, sources: &[PathBuf], dst: &Path) -> Result<(), GdalError> {
        (**self).build_stack(sources, dst)
    }
    fn materialize(
        &self,
        src: &Path,
        dst: &Path,
        creation_options: &[String],
        compute_stats: bool,
    ) -> Result<(), GdalError> {
        (**self).materialize(src, dst, creation_options, compute_stats)
    }
    fn annotate_bands(&self, path: &Path, bands: &[BandAnnotation]) -> Result<(), GdalError> {
        (**self).annotate_bands(path, bands)
    }
    fn build_overviews(&self, path: &Path, resampling: &str, levels: &[i32]) -> Result<(), GdalError> {
        (**self).build_overviews(path, resampling, levels)
    }
}

/// GDAL-backed engine: metadata, VRT stacking, annotation and overviews through
/// the `gdal` bindings, translation through the `gdal_translate` utility.
#[derive(Debug, Clone, Default)]
pub struct GdalEngine {
    /// Directory holding `gdal_translate`; `None` means `$PATH`
    pub bin_dir: Option<PathBuf>,
}

fn color_interpretation(role: ColorRole) -> ColorInterpretation {
    match role {
        ColorRole::Red => ColorInterpretation::RedBand,
        ColorRole::Green => ColorInterpretation::GreenBand,
        ColorRole::Blue => ColorInterpretation::BlueBand,
    }
}

fn path_arg(path: &Path) -> Result<String, GdalError> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| GdalError::Path(path.to_path_buf()))
}

fn push_creation_options(args: &mut Vec<String>, creation_options: &[String]) {
    for co in creation_options {
        args.push("-co".into());
        args.push(co.clone());
    }
}

impl GdalEngine {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self { bin_dir }
    }

    fn tool(&self, name: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    fn run(&self, name: &str, args: &[String]) -> Result<(), GdalError> {
        debug!("{} {}", name, args.join(" "));
        let output = Command::new(self.tool(name))
            .args(args)
            .output()
            .map_err(|source| GdalError::Spawn {
                tool: name.to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(GdalError::Tool {
                tool: name.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn open_update(path: &Path) -> Result<Dataset, GdalError> {
        let ds = Dataset::open_ex(
            path,
            DatasetOptions {
                open_flags: GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_RASTER,
                ..Default::default()
            },
        )?;
        Ok(ds)
    }
}

impl RasterEngine for GdalEngine {
    fn raster_info(&self, path: &Path) -> Result<RasterInfo, GdalError> {
        let dataset = Dataset::open(path)?;
        let (width, height) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        let gt = dataset
            .geo_transform()
            .map_err(|_| GdalError::MissingGeoTransform(path.to_path_buf()))?;
        Ok(RasterInfo {
            width,
            height,
            pixel_width: gt[1].abs(),
            pixel_height: gt[5].abs(),
            bands,
        })
    }

    fn resample(
        &self,
        src: &Path,
        dst: &Path,
        size: (usize, usize),
        creation_options: &[String],
    ) -> Result<(), GdalError> {
        let mut args: Vec<String> = vec![
            "-q".into(),
            "-of".into(),
            "GTiff".into(),
            "-outsize".into(),
            size.0.to_string(),
            size.1.to_string(),
            "-r".into(),
            "nearest".into(),
        ];
        push_creation_options(&mut args, creation_options);
        args.push(path_arg(src)?);
        args.push(path_arg(dst)?);
        self.run("gdal_translate", &args)
    }

    fn build_stack(&self, sources: &[PathBuf], dst: &Path) -> Result<(), GdalError> {
        let datasets = sources
            .iter()
            .map(Dataset::open)
            .collect::<Result<Vec<_>, _>>()?;
        let options = BuildVRTOptions::new(["-separate"])?;
        debug!("build_vrt -separate {:?} ({} sources)", dst, datasets.len());
        // The VRT is written when the returned dataset is dropped.
        build_vrt(Some(dst), &datasets, Some(options))?;
        Ok(())
    }

    fn materialize(
        &self,
        src: &Path,
        dst: &Path,
        creation_options: &[String],
        compute_stats: bool,
    ) -> Result<(), GdalError> {
        let mut args: Vec<String> = vec!["-q".into(), "-of".into(), "GTiff".into()];
        if compute_stats {
            args.push("-stats".into());
        }
        push_creation_options(&mut args, creation_options);
        args.push(path_arg(src)?);
        args.push(path_arg(dst)?);
        self.run("gdal_translate", &args)
    }

    fn annotate_bands(&self, path: &Path, bands: &[BandAnnotation]) -> Result<(), GdalError> {
        let dataset = Self::open_update(path)?;
        let count = dataset.raster_count() as usize;
        for annotation in bands {
            if annotation.index == 0 || annotation.index > count {
                return Err(GdalError::BandIndex {
                    index: annotation.index,
                    count,
                });
            }
            let mut band = dataset.rasterband(annotation.index)?;
            band.set_description(&annotation.description)?;
            if let Some(role) = annotation.role {
                band.set_color_interpretation(color_interpretation(role))?;
            }
        }
        Ok(())
    }

    fn build_overviews(&self, path: &Path, resampling: &str, levels: &[i32]) -> Result<(), GdalError> {
        let mut dataset = Self::open_update(path)?;
        dataset.build_overviews(resampling, levels, &[])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::DriverManager;

    fn write_geotiff(path: &Path, cols: usize, rows: usize, bands: usize, pixel: f64) {
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut ds = driver
            .create_with_band_type::<u16, _>(path, cols, rows, bands)
            .unwrap();
        ds.set_geo_transform(&[500000.0, pixel, 0.0, 4600020.0, 0.0, -pixel])
            .unwrap();
    }

    #[test]
    fn reads_size_and_pixel_spacing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("T36TWN_20240115T083251_B05_20m.tif");
        write_geotiff(&path, 30, 20, 1, 20.0);

        let info = GdalEngine::default().raster_info(&path).unwrap();
        assert_eq!((info.width, info.height, info.bands), (30, 20, 1));
        assert_eq!(info.pixel_width, 20.0);
        assert_eq!(info.pixel_height, 20.0);
    }

    #[test]
    fn annotates_descriptions_and_roles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.tif");
        write_geotiff(&path, 8, 8, 2, 10.0);

        let engine = GdalEngine::default();
        engine
            .annotate_bands(
                &path,
                &[
                    BandAnnotation { index: 1, description: "B04".into(), role: Some(ColorRole::Red) },
                    BandAnnotation { index: 2, description: "B05".into(), role: None },
                ],
            )
            .unwrap();

        let ds = Dataset::open(&path).unwrap();
        let b1 = ds.rasterband(1).unwrap();
        assert_eq!(b1.description().unwrap(), "B04");
        assert_eq!(b1.color_interpretation(), ColorInterpretation::RedBand);
        assert_eq!(ds.rasterband(2).unwrap().description().unwrap(), "B05");
    }

    #[test]
    fn rejects_out_of_range_band() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.tif");
        write_geotiff(&path, 4, 4, 1, 10.0);

        let err = GdalEngine::default()
            .annotate_bands(
                &path,
                &[BandAnnotation { index: 2, description: "B03".into(), role: None }],
            )
            .unwrap_err();
        assert!(matches!(err, GdalError::BandIndex { index: 2, count: 1 }));
    }

    #[test]
    fn stacks_sources_as_separate_bands() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("B04_resampled.tif");
        let b = dir.path().join("B03_resampled.tif");
        write_geotiff(&a, 6, 6, 1, 10.0);
        write_geotiff(&b, 6, 6, 1, 10.0);
        let vrt = dir.path().join("stack.vrt");

        let engine = GdalEngine::default();
        engine.build_stack(&[a, b], &vrt).unwrap();

        let info = engine.raster_info(&vrt).unwrap();
        assert_eq!((info.width, info.height, info.bands), (6, 6, 2));
    }
}
