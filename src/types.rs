//! Shared types and fixed conventions used across s2stack.
//! Includes `ResolutionTier`, `ColorRole`, the band priority table, and the
//! scene/band value types passed between pipeline stages.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Filename token delimiter used by the extraction collaborator.
pub const FILENAME_DELIMITER: char = '_';

/// Extension of the per-band source rasters (compared case-insensitively).
pub const SOURCE_EXTENSION: &str = "jp2";

/// Band code of the scene classification layer.
pub const CLASSIFICATION_CODE: &str = "SCL";

/// The only tier the classification layer is ever taken from.
pub const CLASSIFICATION_TIER: ResolutionTier = ResolutionTier::R20m;

/// Native resolution classes, declared in preference order (finest first).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ResolutionTier {
    R10m,
    R20m,
    R60m,
}

impl ResolutionTier {
    pub const ALL: [ResolutionTier; 3] =
        [ResolutionTier::R10m, ResolutionTier::R20m, ResolutionTier::R60m];

    /// Directory-name suffix marking a tier directory.
    pub fn marker(self) -> &'static str {
        match self {
            ResolutionTier::R10m => "R10m",
            ResolutionTier::R20m => "R20m",
            ResolutionTier::R60m => "R60m",
        }
    }

    /// Trailing filename token used when rasters sit directly in a scene directory.
    pub fn file_token(self) -> &'static str {
        match self {
            ResolutionTier::R10m => "10m",
            ResolutionTier::R20m => "20m",
            ResolutionTier::R60m => "60m",
        }
    }

    /// Nominal pixel size in metres.
    pub fn nominal_resolution(self) -> f64 {
        match self {
            ResolutionTier::R10m => 10.0,
            ResolutionTier::R20m => 20.0,
            ResolutionTier::R60m => 60.0,
        }
    }

    /// Position in the preference order; lower wins.
    pub fn preference(self) -> usize {
        self as usize
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| name.ends_with(t.marker()))
    }

    pub fn from_file_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| token.eq_ignore_ascii_case(t.file_token()))
    }
}

impl std::fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.marker())
    }
}

/// Display role attached to a composite band.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ColorRole {
    Red,
    Green,
    Blue,
}

impl std::fmt::Display for ColorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorRole::Red => write!(f, "Red"),
            ColorRole::Green => write!(f, "Green"),
            ColorRole::Blue => write!(f, "Blue"),
        }
    }
}

/// One row of the band priority table.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct BandSpec {
    pub code: &'static str,
    pub role: Option<ColorRole>,
}

/// Composite band order. The table position is the priority rank.
pub const BAND_TABLE: [BandSpec; 12] = [
    BandSpec { code: "B04", role: Some(ColorRole::Red) },
    BandSpec { code: "B03", role: Some(ColorRole::Green) },
    BandSpec { code: "B02", role: Some(ColorRole::Blue) },
    BandSpec { code: "B01", role: None },
    BandSpec { code: "B05", role: None },
    BandSpec { code: "B06", role: None },
    BandSpec { code: "B07", role: None },
    BandSpec { code: "B08", role: None },
    BandSpec { code: "B8A", role: None },
    BandSpec { code: "B09", role: None },
    BandSpec { code: "B11", role: None },
    BandSpec { code: "B12", role: None },
];

/// Looks a band code up in the priority table, returning `(rank, spec)`.
pub fn band_spec(code: &str) -> Option<(usize, &'static BandSpec)> {
    BAND_TABLE.iter().enumerate().find(|(_, s)| s.code == code)
}

/// Identity of one acquisition: tile id plus acquisition timestamp.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct SceneId {
    pub tile: String,
    pub timestamp: String,
}

impl SceneId {
    pub fn new(tile: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            tile: tile.into(),
            timestamp: timestamp.into(),
        }
    }

    /// `<tile-id>_<timestamp>`, the stem of every output for this scene.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.tile, self.timestamp)
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.tile, self.timestamp)
    }
}

/// A band raster found on disk at a given tier.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BandObservation {
    pub scene: SceneId,
    pub code: String,
    pub tier: ResolutionTier,
    pub path: PathBuf,
}

/// The observation chosen for a band code after reconciliation.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SelectedBand {
    pub code: String,
    pub tier: ResolutionTier,
    pub path: PathBuf,
}

impl From<&BandObservation> for SelectedBand {
    fn from(obs: &BandObservation) -> Self {
        Self {
            code: obs.code.clone(),
            tier: obs.tier,
            path: obs.path.clone(),
        }
    }
}

/// A resampled copy of one selected band living in the scene's temp directory.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TempArtifact {
    pub code: String,
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
}

/// Per-scene pipeline states, in order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum SceneStage {
    Discovered,
    BandsEnumerated,
    Reconciled,
    Resampled,
    Composited,
    OverviewsBuilt,
    ClassificationHandled,
    CleanedUp,
}

impl std::fmt::Display for SceneStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SceneStage::Discovered => "Discovered",
            SceneStage::BandsEnumerated => "BandsEnumerated",
            SceneStage::Reconciled => "Reconciled",
            SceneStage::Resampled => "Resampled",
            SceneStage::Composited => "Composited",
            SceneStage::OverviewsBuilt => "OverviewsBuilt",
            SceneStage::ClassificationHandled => "ClassificationHandled",
            SceneStage::CleanedUp => "CleanedUp",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_prefer_finest() {
        assert!(ResolutionTier::R10m.preference() < ResolutionTier::R20m.preference());
        assert!(ResolutionTier::R20m.preference() < ResolutionTier::R60m.preference());
        assert_eq!(ResolutionTier::from_dir_name("IMG_R20m"), Some(ResolutionTier::R20m));
        assert_eq!(ResolutionTier::from_dir_name("R60m"), Some(ResolutionTier::R60m));
        assert_eq!(ResolutionTier::from_dir_name("QI_DATA"), None);
        assert_eq!(ResolutionTier::from_file_token("10m"), Some(ResolutionTier::R10m));
    }

    #[test]
    fn only_true_color_bands_carry_roles() {
        let roles: Vec<_> = BAND_TABLE.iter().filter_map(|s| s.role).collect();
        assert_eq!(roles, vec![ColorRole::Red, ColorRole::Green, ColorRole::Blue]);
        assert_eq!(band_spec("B04").map(|(r, _)| r), Some(0));
        assert_eq!(band_spec("B8A").map(|(r, _)| r), Some(8));
        assert!(band_spec("SCL").is_none());
        assert!(band_spec("TCI").is_none());
    }
}
