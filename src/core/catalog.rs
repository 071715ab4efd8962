//! Band enumeration for one scene directory.
//!
//! Every raster under a resolution-tier directory (or directly in the scene
//! directory, with the tier taken from the trailing filename token) becomes a
//! [`BandObservation`]. Enumeration is pure: malformed names are reported and
//! skipped, never fatal.
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::io::locator::is_source_raster;
use crate::report::{Event, Reporter};
use crate::types::{BandObservation, FILENAME_DELIMITER, ResolutionTier, SceneId};

/// Tokens extracted from a band raster filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub scene: SceneId,
    pub code: String,
    /// Last token of the stem (e.g. `10m`), if the name carries one after the band code
    pub trailing: String,
}

/// Split `<tile>_<timestamp>_..._<band>_<res>.<ext>` into its identity tokens.
pub fn parse_band_filename(name: &str) -> std::result::Result<ParsedName, String> {
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    };
    let tokens: Vec<&str> = stem.split(FILENAME_DELIMITER).collect();
    if tokens.len() < 3 || tokens.iter().any(|t| t.is_empty()) {
        return Err(format!(
            "expected at least 3 '{}'-separated tokens, found {}",
            FILENAME_DELIMITER,
            tokens.len()
        ));
    }
    Ok(ParsedName {
        scene: SceneId::new(tokens[0], tokens[1]),
        code: tokens[tokens.len() - 2].to_string(),
        trailing: tokens[tokens.len() - 1].to_string(),
    })
}

/// All band observations of one scene, in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct BandCatalog {
    pub scene: Option<SceneId>,
    pub observations: Vec<BandObservation>,
}

impl BandCatalog {
    /// Build a catalog from already-known observations; the scene is taken from the first one.
    pub fn from_observations(observations: Vec<BandObservation>) -> Self {
        Self {
            scene: observations.first().map(|o| o.scene.clone()),
            observations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Enumerate `scene_dir`. `label` identifies the scene in reports until its id is known.
    pub fn scan<R: Reporter + ?Sized>(scene_dir: &Path, label: &str, reporter: &R) -> Result<Self> {
        let mut candidates: Vec<(PathBuf, Option<ResolutionTier>)> = Vec::new();
        collect(scene_dir, None, true, &mut candidates)?;

        let mut catalog = BandCatalog::default();
        for (path, dir_tier) in candidates {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let parsed = match parse_band_filename(&name) {
                Ok(p) => p,
                Err(reason) => {
                    reporter.record(
                        Event::EnumerationWarning,
                        label,
                        &format!("skipping {}: {}", path.display(), reason),
                    );
                    continue;
                }
            };
            let tier = match dir_tier.or_else(|| ResolutionTier::from_file_token(&parsed.trailing)) {
                Some(t) => t,
                None => {
                    reporter.record(
                        Event::EnumerationWarning,
                        label,
                        &format!("skipping {}: no resolution tier", path.display()),
                    );
                    continue;
                }
            };
            match &catalog.scene {
                None => catalog.scene = Some(parsed.scene.clone()),
                Some(scene) if *scene != parsed.scene => {
                    reporter.record(
                        Event::EnumerationWarning,
                        label,
                        &format!("skipping {}: belongs to scene {}, not {}", path.display(), parsed.scene, scene),
                    );
                    continue;
                }
                Some(_) => {}
            }
            catalog.observations.push(BandObservation {
                scene: parsed.scene,
                code: parsed.code,
                tier,
                path,
            });
        }

        let label = catalog.scene.as_ref().map(|s| s.to_string()).unwrap_or_else(|| label.to_string());
        reporter.record(
            Event::BandsEnumerated,
            &label,
            &format!("{} band observations in {}", catalog.observations.len(), scene_dir.display()),
        );
        Ok(catalog)
    }
}

// Files directly in the scene directory are flat-layout candidates (tier from the
// filename); files below are candidates only inside a tier-marked directory.
fn collect(
    dir: &Path,
    tier: Option<ResolutionTier>,
    is_root: bool,
    out: &mut Vec<(PathBuf, Option<ResolutionTier>)>,
) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        entries.push(entry?.path());
    }
    entries.sort();

    for path in entries {
        if path.is_dir() {
            if path.is_symlink() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            let child_tier = ResolutionTier::from_dir_name(name).or(tier);
            collect(&path, child_tier, false, out)?;
        } else if is_source_raster(&path) && (is_root || tier.is_some()) {
            out.push((path, tier));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReporter;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn parses_identity_tokens() {
        let p = parse_band_filename("T36TWN_20240115T083251_B8A_20m.jp2").unwrap();
        assert_eq!(p.scene, SceneId::new("T36TWN", "20240115T083251"));
        assert_eq!(p.code, "B8A");
        assert_eq!(p.trailing, "20m");
        assert!(parse_band_filename("B04_10m.jp2").is_err());
        assert!(parse_band_filename("T36TWN__B04_10m.jp2").is_err());
    }

    #[test]
    fn scans_tier_directories_and_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("IMG_DATA");
        touch(&scene.join("R10m/T36TWN_20240115T083251_B04_10m.jp2"));
        touch(&scene.join("R20m/T36TWN_20240115T083251_B04_20m.jp2"));
        touch(&scene.join("R20m/T36TWN_20240115T083251_SCL_20m.jp2"));
        touch(&scene.join("R20m/bad.jp2"));
        touch(&scene.join("R60m/T36TWN_20240115T083251_B01_60m.JP2"));
        touch(&scene.join("QI_DATA/T36TWN_20240115T083251_B02_10m.jp2"));
        touch(&scene.join("R10m/T36TWN_20240115T083251_B04_10m.aux.xml"));

        let reporter = MemoryReporter::new();
        let catalog = BandCatalog::scan(&scene, "IMG_DATA", &reporter).unwrap();

        assert_eq!(catalog.scene, Some(SceneId::new("T36TWN", "20240115T083251")));
        let seen: Vec<_> = catalog
            .observations
            .iter()
            .map(|o| (o.code.as_str(), o.tier))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("B04", ResolutionTier::R10m),
                ("B04", ResolutionTier::R20m),
                ("SCL", ResolutionTier::R20m),
                ("B01", ResolutionTier::R60m),
            ]
        );
        assert_eq!(reporter.count(Event::EnumerationWarning), 1);
    }

    #[test]
    fn flat_layout_takes_tier_from_filename() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path();
        touch(&scene.join("T35TPF_20240116T090000_B02_10m.jp2"));
        touch(&scene.join("T35TPF_20240116T090000_B11_20m.jp2"));
        touch(&scene.join("T35TPF_20240116T090000_B11_raw.jp2"));
        touch(&scene.join("T99XXX_20240116T090000_B03_10m.jp2"));

        let reporter = MemoryReporter::new();
        let catalog = BandCatalog::scan(scene, "flat", &reporter).unwrap();
        let seen: Vec<_> = catalog.observations.iter().map(|o| (o.code.as_str(), o.tier)).collect();
        assert_eq!(seen, vec![("B02", ResolutionTier::R10m), ("B11", ResolutionTier::R20m)]);
        assert_eq!(reporter.count(Event::EnumerationWarning), 2);
    }
}
