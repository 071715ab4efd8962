//! Per-scene processing stages: resampling, composite assembly, overviews,
//! classification export, and the pipeline that sequences them.
pub mod classification;
pub mod composite;
pub mod pipeline;
pub mod pyramid;
pub mod resample;
