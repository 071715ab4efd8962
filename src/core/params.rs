use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::retry::RetryPolicy;

/// Pipeline parameters suitable for config files and CLI overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Common output pixel size in metres
    pub target_resolution: f64,
    /// Band codes never selected for the composite
    pub denylist: Vec<String>,
    /// Overview decimation factors built on the composite
    pub overview_levels: Vec<i32>,
    /// GDAL resampling name used for overviews
    pub overview_resampling: String,
    /// GTiff creation options applied to every written raster
    pub creation_options: Vec<String>,
    /// Extension of composite and classification outputs
    pub output_extension: String,
    /// Attempts per temp-file deletion
    pub cleanup_attempts: u32,
    /// Delay between deletion attempts, in milliseconds
    pub cleanup_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_resolution: 10.0,
            denylist: vec!["B01".to_string(), "B09".to_string()],
            overview_levels: vec![2, 4, 8, 16, 32],
            overview_resampling: "NEAREST".to_string(),
            creation_options: [
                "COMPRESS=LZW",
                "PREDICTOR=2",
                "TILED=YES",
                "BLOCKXSIZE=256",
                "BLOCKYSIZE=256",
                "BIGTIFF=YES",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            output_extension: "tif".to_string(),
            cleanup_attempts: 5,
            cleanup_delay_ms: 1000,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file; missing keys fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .map_err(|e| Error::invalid("config", format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target_resolution.is_finite() || self.target_resolution <= 0.0 {
            return Err(Error::invalid("target_resolution", self.target_resolution));
        }
        if let Some(bad) = self.overview_levels.iter().find(|&&l| l < 2) {
            return Err(Error::invalid("overview_levels", bad));
        }
        if self.cleanup_attempts == 0 {
            return Err(Error::invalid("cleanup_attempts", 0));
        }
        if self.output_extension.is_empty() {
            return Err(Error::invalid("output_extension", "<empty>"));
        }
        Ok(())
    }

    pub fn is_denied(&self, code: &str) -> bool {
        self.denylist.iter().any(|d| d == code)
    }

    pub fn cleanup_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.cleanup_attempts, Duration::from_millis(self.cleanup_delay_ms))
    }
}
