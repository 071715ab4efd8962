//! Reporting seam for pipeline events.
//!
//! The pipeline never logs directly; it records `(event, scene, detail)` through a
//! [`Reporter`]. [`TracingReporter`] forwards to `tracing`, [`MemoryReporter`] keeps
//! timestamped records in memory for tests and embedding applications.
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

/// Everything the pipeline can report.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Event {
    SceneDiscovered,
    BandsEnumerated,
    /// Malformed or unclassifiable filename, file skipped.
    EnumerationWarning,
    /// Observation not eligible for selection (unknown code, denylist, wrong SCL tier).
    BandIgnored,
    BandSelected,
    BandResampled,
    BandResampleFailed,
    CompositeWritten,
    CompositeFailed,
    OverviewsBuilt,
    OverviewsFailed,
    ClassificationExported,
    ClassificationFailed,
    ClassificationAbsent,
    CleanupRetry,
    CleanupWarning,
    SceneCompleted,
    SceneFailed,
}

impl Event {
    pub fn level(self) -> tracing::Level {
        match self {
            Event::BandIgnored | Event::BandSelected | Event::CleanupRetry => tracing::Level::DEBUG,
            Event::EnumerationWarning
            | Event::BandResampleFailed
            | Event::OverviewsFailed
            | Event::ClassificationFailed
            | Event::CleanupWarning => tracing::Level::WARN,
            Event::CompositeFailed | Event::SceneFailed => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub trait Reporter {
    fn record(&self, event: Event, scene: &str, detail: &str);
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn record(&self, event: Event, scene: &str, detail: &str) {
        (**self).record(event, scene, detail)
    }
}

/// Forwards events to the `tracing` macros at the event's level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn record(&self, event: Event, scene: &str, detail: &str) {
        match event.level() {
            tracing::Level::ERROR => error!(%event, scene, "{}", detail),
            tracing::Level::WARN => warn!(%event, scene, "{}", detail),
            tracing::Level::INFO => info!(%event, scene, "{}", detail),
            _ => debug!(%event, scene, "{}", detail),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Record {
    pub timestamp: String,
    pub event: Event,
    pub scene: String,
    pub detail: String,
}

/// Collects records in memory. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemoryReporter {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        match self.records.lock() {
            Ok(buf) => buf.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.records().into_iter().map(|r| r.event).collect()
    }

    pub fn count(&self, event: Event) -> usize {
        self.records().iter().filter(|r| r.event == event).count()
    }
}

impl Reporter for MemoryReporter {
    fn record(&self, event: Event, scene: &str, detail: &str) {
        let entry = Record {
            timestamp: chrono::Utc::now().format("%H:%M:%S%.3f").to_string(),
            event,
            scene: scene.to_string(),
            detail: detail.to_string(),
        };
        match self.records.lock() {
            Ok(mut buf) => buf.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_reporter_shares_buffer_between_clones() {
        let reporter = MemoryReporter::new();
        let other = reporter.clone();
        other.record(Event::CleanupWarning, "T1_X", "left temp.tif");
        reporter.record(Event::SceneCompleted, "T1_X", "");

        assert_eq!(reporter.events(), vec![Event::CleanupWarning, Event::SceneCompleted]);
        assert_eq!(reporter.count(Event::CleanupWarning), 1);
        assert_eq!(reporter.records()[0].detail, "left temp.tif");
    }

    #[test]
    fn absorbed_failures_are_warnings() {
        assert_eq!(Event::BandResampleFailed.level(), tracing::Level::WARN);
        assert_eq!(Event::OverviewsFailed.level(), tracing::Level::WARN);
        assert_eq!(Event::SceneFailed.level(), tracing::Level::ERROR);
    }
}
