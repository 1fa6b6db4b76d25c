//! Batch generation pipeline
//!
//! Sites are processed strictly one at a time in input order. Per-site
//! failures are collected in the [`BatchReport`]; only batch-level problems
//! (no sites, archive path collisions, unusable output root) abort the run.
//!
//! Runs sharing an output, jobs or cache directory must not overlap; nothing
//! here locks those directories.

mod orchestrator;
mod report;

pub use orchestrator::{planned_archive_paths, BatchOptions, Pipeline};
pub use report::{BatchReport, FailureKind, PipelineResult, SiteFailure, SiteOutcome};
