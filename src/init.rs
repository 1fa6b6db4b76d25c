//! Workspace initialization via `hems init`.
//!
//! Writes `config/config.toml` with every default spelled out so users can
//! edit values in place.

use crate::atomic::write_atomic;
use crate::config::{ConfigLoader, HemsConfig};
use crate::error::ApiError;
use std::path::{Path, PathBuf};

const HEADER: &str = "\
# HEMS scenery generator configuration.
#
# Layering: built-in defaults < global config < this file < config/{HEMS_ENV}.toml
# < HEMS__SECTION__KEY environment variables.
# jobs_dir and cache_dir default to <output_dir>/jobs and <output_dir>/cache.

";

/// Result of initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created(PathBuf),
    /// An existing file was left untouched
    Skipped(PathBuf),
}

impl InitOutcome {
    pub fn path(&self) -> &Path {
        match self {
            InitOutcome::Created(path) | InitOutcome::Skipped(path) => path,
        }
    }
}

/// Default configuration rendered as commented TOML.
pub fn render_default_config() -> Result<String, ApiError> {
    let body = toml::to_string_pretty(&HemsConfig::default())
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize default config: {}", e)))?;
    Ok(format!("{}{}", HEADER, body))
}

/// Write the default workspace config unless it exists and `force` is unset.
pub fn initialize_workspace(workspace_root: &Path, force: bool) -> Result<InitOutcome, ApiError> {
    let path = ConfigLoader::workspace_config_path(workspace_root);
    if path.exists() && !force {
        return Ok(InitOutcome::Skipped(path));
    }

    let content = render_default_config()?;
    write_atomic(&path, content.as_bytes())?;
    Ok(InitOutcome::Created(path))
}
