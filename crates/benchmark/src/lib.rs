//! Benchmark suite for sheetnest.
//!
//! This crate provides:
//! - A JSON job format (sheet size, spacing, part templates with quantities)
//! - Synthetic job generation with convex, concave and holed parts
//! - A runner that nests a job with several strategies and seeds
//! - Result recording and per-strategy summaries

mod job;
mod result;
mod runner;
mod synthetic;

pub use job::{Job, JobError, JobItem};
pub use result::{BenchmarkResult, RunResult, StrategySummary};
pub use runner::{BenchmarkConfig, BenchmarkRunner};
pub use synthetic::SyntheticGenerator;
