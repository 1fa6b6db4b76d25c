//! Entry point for loading `HemsConfig` from its layered sources.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::HemsConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, the global file, workspace files and environment overrides.
    pub fn load(workspace_root: &Path) -> Result<HemsConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        merge_policy::with_environment(builder)
            .build()?
            .try_deserialize()
    }

    /// Load from one explicit file, skipping the global and workspace files.
    /// Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<HemsConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        merge_policy::with_environment(builder)
            .build()?
            .try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
        workspace_file::workspace_config_path(workspace_root)
    }
}
