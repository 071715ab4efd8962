//! Removal of per-scene temporary artifacts with bounded retry.
//!
//! Deletion failures are never escalated: whatever cannot be removed after the
//! retry budget is returned as a leftover and reported as a cleanup warning.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::io::retry::{RetryPolicy, is_transient_io, retry_with};
use crate::report::{Event, Reporter};

/// Outcome of sweeping one temp directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub leftovers: Vec<PathBuf>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.leftovers.is_empty()
    }
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    let removal = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match removal {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

pub struct Janitor<'r, R: Reporter + ?Sized> {
    policy: RetryPolicy,
    reporter: &'r R,
    scene: String,
}

impl<'r, R: Reporter + ?Sized> Janitor<'r, R> {
    pub fn new(policy: RetryPolicy, reporter: &'r R, scene: impl Into<String>) -> Self {
        Self {
            policy,
            reporter,
            scene: scene.into(),
        }
    }

    /// Remove a single path (file or directory tree). Missing paths count as removed.
    pub fn remove(&self, path: &Path) -> std::io::Result<()> {
        self.remove_with(path, &mut remove_path)
    }

    /// [`Janitor::remove`] with a caller-supplied removal operation.
    pub fn remove_with<F>(&self, path: &Path, op: &mut F) -> std::io::Result<()>
    where
        F: FnMut(&Path) -> std::io::Result<()>,
    {
        retry_with(
            self.policy,
            is_transient_io,
            |attempt, e| {
                self.reporter.record(
                    Event::CleanupRetry,
                    &self.scene,
                    &format!("attempt {} on {}: {}", attempt, path.display(), e),
                )
            },
            || op(path),
        )
    }

    /// Remove every entry of `dir` and then `dir` itself.
    pub fn sweep(&self, dir: &Path) -> CleanupReport {
        self.sweep_with(dir, remove_path)
    }

    /// [`Janitor::sweep`] with a caller-supplied removal operation.
    pub fn sweep_with<F>(&self, dir: &Path, mut op: F) -> CleanupReport
    where
        F: FnMut(&Path) -> std::io::Result<()>,
    {
        let mut report = CleanupReport::default();

        let entries = match fs::read_dir(dir) {
            Ok(rd) => {
                let mut paths: Vec<PathBuf> = rd.filter_map(|e| e.ok().map(|e| e.path())).collect();
                paths.sort();
                paths
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return report,
            Err(e) => {
                self.warn(dir, &e);
                report.leftovers.push(dir.to_path_buf());
                return report;
            }
        };

        for path in entries {
            match self.remove_with(&path, &mut op) {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    self.warn(&path, &e);
                    report.leftovers.push(path);
                }
            }
        }

        if report.leftovers.is_empty() {
            if let Err(e) = self.remove_with(dir, &mut op) {
                self.warn(dir, &e);
                report.leftovers.push(dir.to_path_buf());
            }
        } else {
            report.leftovers.push(dir.to_path_buf());
        }
        report
    }

    fn warn(&self, path: &Path, e: &std::io::Error) {
        self.reporter.record(
            Event::CleanupWarning,
            &self.scene,
            &format!("could not remove {}: {}", path.display(), e),
        );
    }
}
