//! Command Line Interface (CLI) layer for S2STACK.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for batch processing of an
//! extraction tree. It wires user-provided options to the underlying
//! library functionality exposed via `s2stack::api`.
//!
//! If you are embedding S2STACK into another application, prefer using
//! the high-level `s2stack::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
