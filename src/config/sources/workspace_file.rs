//! Workspace config file source: config/config.toml and config/{env}.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

pub const DEFAULT_ENV: &str = "development";

/// `{workspace}/config/config.toml`
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join("config").join("config.toml")
}

/// Add workspace config files to builder.
/// Precedence: config/config.toml (base) then config/{HEMS_ENV}.toml (env-specific).
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workspace_root.join("config");
    let env_name = std::env::var("HEMS_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = builder;

    let base_config_path = workspace_config_path(workspace_root);
    if base_config_path.exists() {
        builder = builder.add_source(File::from(base_config_path).required(false));
    }

    let env_config_path = config_dir.join(format!("{}.toml", env_name));
    if env_config_path.exists() {
        builder = builder.add_source(File::from(env_config_path).required(false));
    }

    Ok(builder)
}
