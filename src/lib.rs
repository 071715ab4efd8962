#![doc = r#"
S2STACK: Sentinel-2 band reconciliation and composite assembly.

This crate turns per-band Sentinel-2 rasters, delivered in several native
resolution tiers (`R10m`, `R20m`, `R60m`), into one multi-band GeoTIFF per scene
on a common grid, plus an optional, separately exported scene classification
layer (SCL). It powers the `s2stack` CLI and can be embedded in your own Rust
applications.

Pipeline
--------
For every scene directory found under the input root:

1. enumerate band rasters per tier (`core::catalog`),
2. keep the finest tier per band, the SCL only from `R20m`, drop the denylist (`core::reconcile`),
3. resample each band to the target resolution with nearest neighbour,
4. stack in fixed priority order (`B04, B03, B02, ...`) and materialize a tiled,
   LZW-compressed BigTIFF with statistics, band descriptions and RGB roles,
5. build nearest-neighbour overviews,
6. export the SCL on its own,
7. sweep the scene's temp directory, whatever happened before.

Requirements
------------
- GDAL development headers and runtime, and the `gdal_translate` utility,
  available on your system.
- Rust 2024 edition toolchain.

Quick start: process an extraction tree
---------------------------------------
```rust,no_run
use std::path::Path;
use s2stack::{process_tree_to_path, PipelineConfig};

fn main() -> s2stack::Result<()> {
    let report = process_tree_to_path(
        Path::new("SN2_Extract"),
        Path::new("Raster_Processed"),
        Path::new("SCL_Classified"),
        &PipelineConfig::default(),
    )?;
    println!("processed={} errors={}", report.processed, report.errors);
    Ok(())
}
```

Custom engine and reporter
--------------------------
```rust,no_run
use std::path::Path;
use s2stack::{process_scene, GdalEngine, MemoryReporter, PipelineConfig};

fn main() -> s2stack::Result<()> {
    let reporter = MemoryReporter::new();
    let config = PipelineConfig { target_resolution: 20.0, ..Default::default() };
    let outcome = process_scene(
        &GdalEngine::default(),
        &reporter,
        &config,
        Path::new("/data/S2A_MSIL2A.SAFE/GRANULE/L2A_T36TWN/IMG_DATA"),
        Path::new("T36TWN"),
        Path::new("/out"),
        Path::new("/out_scl"),
    )?;
    println!("{:?} -> {}", outcome.bands, outcome.composite.display());
    for record in reporter.records() {
        println!("{} {} {}", record.timestamp, record.event, record.detail);
    }
    Ok(())
}
```

Error handling
--------------
All public functions return `s2stack::Result<T>`. Per-band resampling failures,
overview failures, classification export failures and cleanup leftovers never
surface as errors; they are recorded through the [`report::Reporter`].

Useful modules
--------------
- [`api`]: high-level entry points.
- [`core`]: catalog, reconciliation, parameters, processing stages.
- [`io`]: scene discovery, GDAL engine, cleanup and retry.
- [`report`]: pipeline event reporting.
- [`types`]: tiers, band table, scene value types.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod report;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::PipelineConfig;
pub use error::{Error, Result};
pub use types::{
    BAND_TABLE, BandObservation, BandSpec, ColorRole, ResolutionTier, SceneId, SceneStage,
    SelectedBand, TempArtifact,
};

// Stages
pub use crate::core::catalog::BandCatalog;
pub use crate::core::processing::pipeline::{SceneOutcome, ScenePipeline, SceneTargets};
pub use crate::core::reconcile::{Reconciliation, reconcile};

// Engine, discovery and cleanup
pub use io::{
    BandAnnotation, CleanupReport, GdalEngine, GdalError, Janitor, RasterEngine, RasterInfo,
    RetryPolicy, SceneDir, SceneLocator,
};

// Reporting
pub use report::{Event, MemoryReporter, Reporter, TracingReporter};

// High-level API re-exports
pub use api::{BatchReport, iterate_scenes, process_scene, process_tree, process_tree_to_path};
