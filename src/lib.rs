//! # runlog-digest: Convergence Telemetry for Optimizer Sweeps
//!
//! Turns the stdout of genetic-algorithm / simulated-annealing runs into
//! comparable convergence charts:
//!
//! ```text
//! raw log ──digest──> telemetry lines ──parse──> records ──aggregate──> trajectory
//!                                                                          │
//! run filename ──decode──> RunDescriptor ──────────────────────────> chart series
//! ```
//!
//! ## Design Principles
//!
//! - **Explicit compaction**: noise lines are dropped by one named
//!   operation, [`digest::retain_telemetry_lines`]
//! - **Typed metadata**: filenames decode into [`descriptor::RunDescriptor`]
//!   up front, or fail with [`Error::SchemaMismatch`]
//! - **All-or-nothing runs**: a malformed line fails its whole run
//! - **No hidden figure state**: series accumulate on a
//!   [`chart::ComparisonChart`] value rendered once
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use runlog_digest::config::PipelineConfig;
//! use runlog_digest::digest::digest_dir;
//! use runlog_digest::pipeline::compare_runs;
//!
//! let config = PipelineConfig::default();
//! digest_dir(&config.raw_dir, &config.runs_dir, &config.extension)?;
//!
//! let report = compare_runs(&config)?;
//! println!("{} runs -> {}", report.collection.runs.len(), report.output.display());
//! # Ok::<(), runlog_digest::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod chart;
pub mod config;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod pipeline;
pub mod store;
pub mod sweep;
pub mod telemetry;
pub mod trajectory;

pub use error::{Error, Result};
