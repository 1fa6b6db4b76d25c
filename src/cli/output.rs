//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, PipelineError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Pipeline(PipelineError::PathCollision { .. }) => format!(
            "{}\nRename one of the sites so their package names differ.",
            e
        ),
        ApiError::ConfigError(_) => format!("{}\nRun `hems init` to write a default config.", e),
        _ => e.to_string(),
    }
}
