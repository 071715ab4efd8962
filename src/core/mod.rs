//! Core building blocks: band enumeration, resolution reconciliation, pipeline
//! parameters, and the processing stages. These are consumed by the high-level
//! `api` module.
pub mod catalog;
pub mod params;
pub mod processing;
pub mod reconcile;
