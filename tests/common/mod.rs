//! In-process raster engine and scene fixtures for pipeline tests.
//!
//! "Rasters" are small text files: the first line is `RASTER <w> <h> <pixel>`,
//! every operation appends or composes lines so outputs can be inspected.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use s2stack::{BandAnnotation, GdalError, RasterEngine, RasterInfo};

#[derive(Default)]
pub struct FakeEngine {
    /// Resampling fails for sources whose filename contains any of these
    pub fail_resample: Vec<String>,
    pub fail_stack: bool,
    /// Fail materialization of the composite (statistics requested)
    pub fail_composite: bool,
    /// Fail materialization of the classification layer (no statistics)
    pub fail_classification: bool,
    pub fail_overviews: bool,
    pub calls: Mutex<Vec<String>>,
}

fn fake_error(what: &str, path: &Path) -> GdalError {
    GdalError::Tool {
        tool: "fake".to_string(),
        status: "1".to_string(),
        stderr: format!("{} failed for {}", what, path.display()),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl FakeEngine {
    fn log(&self, entry: String) {
        self.calls.lock().unwrap().push(entry);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RasterEngine for FakeEngine {
    fn raster_info(&self, path: &Path) -> Result<RasterInfo, GdalError> {
        let text = fs::read_to_string(path).map_err(|_| fake_error("open", path))?;
        let first = text.lines().next().unwrap_or_default();
        let parts: Vec<&str> = first.split_whitespace().collect();
        if parts.len() != 4 || parts[0] != "RASTER" {
            return Err(GdalError::MissingGeoTransform(path.to_path_buf()));
        }
        let width: usize = parts[1].parse().map_err(|_| fake_error("width", path))?;
        let height: usize = parts[2].parse().map_err(|_| fake_error("height", path))?;
        let pixel: f64 = parts[3].parse().map_err(|_| fake_error("pixel", path))?;
        Ok(RasterInfo {
            width,
            height,
            pixel_width: pixel,
            pixel_height: pixel,
            bands: 1,
        })
    }

    fn resample(
        &self,
        src: &Path,
        dst: &Path,
        size: (usize, usize),
        _creation_options: &[String],
    ) -> Result<(), GdalError> {
        let name = file_name(src);
        self.log(format!("resample {} {}x{}", name, size.0, size.1));
        if self.fail_resample.iter().any(|f| name.contains(f.as_str())) {
            return Err(fake_error("resample", src));
        }
        let info = self.raster_info(src)?;
        let pixel = info.pixel_width * info.width as f64 / size.0 as f64;
        fs::write(
            dst,
            format!("RASTER {} {} {}\nfrom {}\n", size.0, size.1, pixel, name),
        )
        .map_err(|_| fake_error("write", dst))
    }

    fn build_stack(&self, sources: &[PathBuf], dst: &Path) -> Result<(), GdalError> {
        self.log(format!("stack {}", sources.len()));
        if self.fail_stack {
            return Err(fake_error("stack", dst));
        }
        let mut text = String::from("VRT\n");
        for src in sources {
            text.push_str(&src.display().to_string());
            text.push('\n');
        }
        fs::write(dst, text).map_err(|_| fake_error("write", dst))
    }

    fn materialize(
        &self,
        src: &Path,
        dst: &Path,
        creation_options: &[String],
        compute_stats: bool,
    ) -> Result<(), GdalError> {
        self.log(format!("materialize {} stats={}", file_name(src), compute_stats));
        if (compute_stats && self.fail_composite) || (!compute_stats && self.fail_classification) {
            return Err(fake_error("materialize", dst));
        }
        let text = fs::read_to_string(src).map_err(|_| fake_error("open", src))?;
        let mut out = format!("GTIFF stats={} {}\n", compute_stats, creation_options.join(","));
        if let Some(rest) = text.strip_prefix("VRT\n") {
            for line in rest.lines() {
                let band = fs::read_to_string(line).map_err(|_| fake_error("open", Path::new(line)))?;
                out.push_str("BAND ");
                out.push_str(&band.lines().collect::<Vec<_>>().join(" "));
                out.push('\n');
            }
        } else {
            out.push_str("BAND ");
            out.push_str(&text.lines().collect::<Vec<_>>().join(" "));
            out.push('\n');
        }
        fs::write(dst, out).map_err(|_| fake_error("write", dst))
    }

    fn annotate_bands(&self, path: &Path, bands: &[BandAnnotation]) -> Result<(), GdalError> {
        self.log(format!("annotate {}", bands.len()));
        let mut text = fs::read_to_string(path).map_err(|_| fake_error("open", path))?;
        for b in bands {
            let role = b.role.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
            text.push_str(&format!("DESC {} {} {}\n", b.index, b.description, role));
        }
        fs::write(path, text).map_err(|_| fake_error("write", path))
    }

    fn build_overviews(&self, path: &Path, resampling: &str, levels: &[i32]) -> Result<(), GdalError> {
        self.log(format!("overviews {} {}", file_name(path), resampling));
        if self.fail_overviews {
            return Err(fake_error("overviews", path));
        }
        let mut text = fs::read_to_string(path).map_err(|_| fake_error("open", path))?;
        text.push_str(&format!("OVERVIEWS {} {:?}\n", resampling, levels));
        fs::write(path, text).map_err(|_| fake_error("write", path))
    }
}

pub const TILE: &str = "T36TWN";
pub const STAMP: &str = "20240115T083251";

pub fn write_band(dir: &Path, code: &str, tier_token: &str, size: usize, pixel: f64) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(format!("{}_{}_{}_{}.jp2", TILE, STAMP, code, tier_token));
    fs::write(&path, format!("RASTER {} {} {}\n", size, size, pixel)).unwrap();
    path
}

/// Lay out an L2A-style scene with the given bands per tier; returns the scene directory.
pub fn write_scene(root: &Path, relative: &str, r10: &[&str], r20: &[&str], r60: &[&str]) -> PathBuf {
    let scene = root.join(relative);
    for code in r10 {
        write_band(&scene.join("R10m"), code, "10m", 60, 10.0);
    }
    for code in r20 {
        write_band(&scene.join("R20m"), code, "20m", 30, 20.0);
    }
    for code in r60 {
        write_band(&scene.join("R60m"), code, "60m", 10, 60.0);
    }
    scene
}

/// The canonical mixed-tier scene: every band at every tier a real L2A product ships.
pub fn write_full_scene(root: &Path, relative: &str) -> PathBuf {
    write_scene(
        root,
        relative,
        &["B02", "B03", "B04", "B08"],
        &["B02", "B03", "B04", "B05", "B06", "B07", "B11", "B12", "B8A", "SCL"],
        &["B01", "B02", "B09", "SCL"],
    )
}

pub fn fast_config() -> s2stack::PipelineConfig {
    s2stack::PipelineConfig {
        cleanup_delay_ms: 0,
        ..Default::default()
    }
}
