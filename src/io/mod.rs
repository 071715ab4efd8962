//! I/O layer: scene discovery on disk, the GDAL-backed raster engine, and
//! temp-artifact cleanup with bounded retry.
pub mod gdal;
pub use self::gdal::{BandAnnotation, GdalEngine, GdalError, RasterEngine, RasterInfo};

pub mod janitor;
pub use janitor::{CleanupReport, Janitor};

pub mod locator;
pub use locator::{SceneDir, SceneLocator};

pub mod retry;
pub use retry::{RetryPolicy, is_transient_io, retry, retry_with};
