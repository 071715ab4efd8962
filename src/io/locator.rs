//! Scene discovery: walk an extraction tree and yield scene directories.
//!
//! A directory is a scene when it holds band rasters for one acquisition, either
//! through tier sub-directories (`.../R10m`, `.../R20m`, `.../R60m`) or directly
//! (flat layout). Scene directories are not descended into further.
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::catalog::parse_band_filename;
use crate::error::{Error, Result};
use crate::types::{CLASSIFICATION_CODE, ResolutionTier, SOURCE_EXTENSION, band_spec};

/// A discovered scene directory together with its path relative to the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneDir {
    pub path: PathBuf,
    pub relative: PathBuf,
}

pub fn is_source_raster(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        entries.push(entry?.path());
    }
    entries.sort();
    Ok(entries)
}

/// A source raster whose filename names a spectral band or the classification layer.
fn is_band_raster(path: &Path) -> bool {
    is_source_raster(path)
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| parse_band_filename(n).ok())
            .is_some_and(|p| p.code == CLASSIFICATION_CODE || band_spec(&p.code).is_some())
}

fn contains_band_rasters(dir: &Path) -> Result<bool> {
    Ok(sorted_entries(dir)?.iter().any(|p| is_band_raster(p)))
}

fn dir_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Decide whether `dir` is a scene directory.
pub fn is_scene_dir(dir: &Path) -> Result<bool> {
    if ResolutionTier::from_dir_name(dir_name(dir)).is_some() {
        return Ok(false);
    }
    for entry in sorted_entries(dir)? {
        if is_band_raster(&entry) {
            return Ok(true);
        }
        if entry.is_dir()
            && ResolutionTier::from_dir_name(dir_name(&entry)).is_some()
            && contains_band_rasters(&entry)?
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Walks a raster archive tree in sorted order.
pub struct SceneLocator {
    root: PathBuf,
}

impl SceneLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All scene directories under the root. A missing root or an empty result is an error.
    pub fn scenes(&self) -> Result<Vec<SceneDir>> {
        if !self.root.is_dir() {
            return Err(Error::MissingInput(self.root.clone()));
        }
        let mut found = Vec::new();
        self.walk(&self.root, &mut found)?;
        if found.is_empty() {
            return Err(Error::NoScenes(self.root.clone()));
        }
        Ok(found)
    }

    fn walk(&self, dir: &Path, found: &mut Vec<SceneDir>) -> Result<()> {
        if is_scene_dir(dir)? {
            let relative = dir.strip_prefix(&self.root).unwrap_or(dir).to_path_buf();
            found.push(SceneDir {
                path: dir.to_path_buf(),
                relative,
            });
            return Ok(());
        }
        for entry in sorted_entries(dir)? {
            if entry.is_dir() && !entry.is_symlink() {
                self.walk(&entry, found)?;
            }
        }
        Ok(())
    }
}
