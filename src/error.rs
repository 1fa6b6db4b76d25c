//! Error types for the HEMS scenery generator.
//!
//! Errors are split by blast radius: `JobError` and `DownstreamError` fail a
//! single site, `CacheError` is logged and swallowed by the pipeline, and
//! `PipelineError` aborts the whole batch.

use std::path::PathBuf;
use thiserror::Error;

/// Job file errors
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid site identifier {identifier:?}: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("Corrupt job file {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Job I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Build cache errors. Never fatal to a site.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache write failed at {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache read failed at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache serialization failed: {0}")]
    Serialize(String),
}

/// Writer and packaging failures
#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsafe package name {name:?}: {reason}")]
    UnsafeName { name: String, reason: String },

    #[error("Archive error for {path:?}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("Serialization failed: {0}")]
    Serialize(String),
}

impl DownstreamError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownstreamError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a single site; the batch continues.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Downstream(#[from] DownstreamError),
}

/// Batch-level errors; these abort the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No sites resolved from input. Provide identifiers or a CSV with faa_id values.")]
    NoSites,

    #[error("Duplicate output path detected: {path:?} (sites {first} and {second})")]
    PathCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("Failed to prepare output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level errors surfaced by the CLI and HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Input error: {0}")]
    InputError(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Downstream(#[from] DownstreamError),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
