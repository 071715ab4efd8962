//! Resolution reconciliation: one observation per band code, finest tier first.
use std::collections::BTreeMap;

use crate::core::catalog::BandCatalog;
use crate::core::params::PipelineConfig;
use crate::report::{Event, Reporter};
use crate::types::{CLASSIFICATION_CODE, CLASSIFICATION_TIER, SelectedBand, band_spec};

/// Result of reconciling one scene's catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Regular spectral bands, keyed by band code
    pub bands: BTreeMap<String, SelectedBand>,
    /// The classification layer observed at its designated tier, if any
    pub classification: Option<SelectedBand>,
    /// Codes dropped by the denylist
    pub denied: Vec<String>,
}

impl Reconciliation {
    pub fn band_codes(&self) -> Vec<&str> {
        self.bands.keys().map(String::as_str).collect()
    }
}

/// Select the best observation per band code.
///
/// Lower tier preference wins; on equal tiers the later observation replaces the
/// earlier one. The classification code only ever comes from its designated tier.
/// Denylisted codes (the classification code included) and codes outside the band
/// table are never selected.
pub fn reconcile<R: Reporter + ?Sized>(
    catalog: &BandCatalog,
    config: &PipelineConfig,
    reporter: &R,
) -> Reconciliation {
    let scene = catalog.scene.as_ref().map(|s| s.to_string()).unwrap_or_default();
    let mut out = Reconciliation::default();

    for obs in &catalog.observations {
        if config.is_denied(&obs.code) {
            if !out.denied.contains(&obs.code) {
                out.denied.push(obs.code.clone());
            }
            continue;
        }
        if obs.code == CLASSIFICATION_CODE {
            if obs.tier == CLASSIFICATION_TIER {
                out.classification = Some(SelectedBand::from(obs));
            } else {
                reporter.record(
                    Event::BandIgnored,
                    &scene,
                    &format!("{} at {} (only {} is used)", obs.code, obs.tier, CLASSIFICATION_TIER),
                );
            }
            continue;
        }
        if band_spec(&obs.code).is_none() {
            reporter.record(
                Event::BandIgnored,
                &scene,
                &format!("{} is not a composite band ({})", obs.code, obs.path.display()),
            );
            continue;
        }

        let replace = match out.bands.get(&obs.code) {
            None => true,
            Some(current) => obs.tier.preference() <= current.tier.preference(),
        };
        if replace {
            out.bands.insert(obs.code.clone(), SelectedBand::from(obs));
        }
    }

    if !out.denied.is_empty() {
        reporter.record(Event::BandIgnored, &scene, &format!("denylisted: {}", out.denied.join(",")));
    }
    for band in out.bands.values() {
        reporter.record(
            Event::BandSelected,
            &scene,
            &format!("{} from {} ({})", band.code, band.tier, band.path.display()),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::report::MemoryReporter;
    use crate::types::{BandObservation, ResolutionTier, SceneId};

    fn obs(code: &str, tier: ResolutionTier, file: &str) -> BandObservation {
        BandObservation {
            scene: SceneId::new("T36TWN", "20240115T083251"),
            code: code.to_string(),
            tier,
            path: PathBuf::from(file),
        }
    }

    fn run(observations: Vec<BandObservation>) -> Reconciliation {
        reconcile(
            &BandCatalog::from_observations(observations),
            &PipelineConfig::default(),
            &MemoryReporter::new(),
        )
    }

    #[test]
    fn finest_tier_wins_regardless_of_order() {
        use ResolutionTier::*;
        let coarse_first = run(vec![obs("B02", R60m, "60"), obs("B02", R20m, "20"), obs("B02", R10m, "10")]);
        let fine_first = run(vec![obs("B02", R10m, "10"), obs("B02", R60m, "60"), obs("B02", R20m, "20")]);
        assert_eq!(coarse_first.bands["B02"].tier, R10m);
        assert_eq!(coarse_first, fine_first);
    }

    #[test]
    fn same_tier_duplicate_keeps_last() {
        let r = run(vec![
            obs("B05", ResolutionTier::R20m, "first"),
            obs("B05", ResolutionTier::R20m, "second"),
        ]);
        assert_eq!(r.bands["B05"].path, PathBuf::from("second"));
    }

    #[test]
    fn classification_only_from_designated_tier() {
        let r = run(vec![obs("SCL", ResolutionTier::R60m, "scl60"), obs("B04", ResolutionTier::R10m, "b4")]);
        assert!(r.classification.is_none());

        let r = run(vec![
            obs("SCL", ResolutionTier::R20m, "scl20"),
            obs("SCL", ResolutionTier::R60m, "scl60"),
        ]);
        assert_eq!(r.classification.unwrap().path, PathBuf::from("scl20"));
        assert!(r.bands.is_empty());
    }

    #[test]
    fn denylist_and_unknown_codes_are_dropped() {
        let r = run(vec![
            obs("B01", ResolutionTier::R60m, "b1"),
            obs("B09", ResolutionTier::R60m, "b9"),
            obs("TCI", ResolutionTier::R10m, "tci"),
            obs("AOT", ResolutionTier::R20m, "aot"),
            obs("B12", ResolutionTier::R20m, "b12"),
        ]);
        assert_eq!(r.band_codes(), vec!["B12"]);
        assert_eq!(r.denied, vec!["B01".to_string(), "B09".to_string()]);
    }

    #[test]
    fn denylisted_classification_is_not_selected() {
        let mut config = PipelineConfig::default();
        config.denylist.push("SCL".to_string());
        let reporter = MemoryReporter::new();
        let r = reconcile(
            &BandCatalog::from_observations(vec![
                obs("SCL", ResolutionTier::R20m, "scl20"),
                obs("B04", ResolutionTier::R10m, "b4"),
            ]),
            &config,
            &reporter,
        );
        assert!(r.classification.is_none());
        assert_eq!(r.denied, vec!["SCL".to_string()]);
        assert_eq!(r.band_codes(), vec!["B04"]);
    }
}
