//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};

/// Prefix for environment overrides, e.g. `HEMS__GENERATOR__AOI_RADIUS_M`.
pub const ENV_PREFIX: &str = "HEMS";
pub const ENV_SEPARATOR: &str = "__";

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("generator.output_dir", "output")?
        .set_default("generator.aoi_radius_m", 600)?
        .set_default("generator.generator_version", crate::config::GENERATOR_VERSION)?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)
}

/// Environment variables are the last and strongest layer.
pub fn with_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    )
}
