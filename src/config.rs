//! Configuration System
//!
//! Layered configuration for the generator, the HTTP control panel and
//! logging. Built-in defaults < global file < workspace files < `HEMS__*`
//! environment variables. Tests included.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Version string mixed into every cache key.
pub const GENERATOR_VERSION: &str = concat!("hems-scenery/", env!("CARGO_PKG_VERSION"));

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HemsConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Batch generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Root for packages and archives
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Job files root; `<output_dir>/jobs` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs_dir: Option<PathBuf>,

    /// Build cache root; `<output_dir>/cache` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    #[serde(default = "default_aoi_radius")]
    pub aoi_radius_m: u32,

    /// Bump to invalidate every cache entry
    #[serde(default = "default_generator_version")]
    pub generator_version: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_aoi_radius() -> u32 {
    600
}

fn default_generator_version() -> String {
    GENERATOR_VERSION.to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            jobs_dir: None,
            cache_dir: None,
            aoi_radius_m: default_aoi_radius(),
            generator_version: default_generator_version(),
        }
    }
}

impl GeneratorConfig {
    /// Generator settings for `output_dir` with everything else defaulted.
    pub fn for_output(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn jobs_root(&self) -> PathBuf {
        self.jobs_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("jobs"))
    }

    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("cache"))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.output_dir.as_os_str().is_empty() {
            return Err("Output directory cannot be empty".to_string());
        }
        if matches!(&self.jobs_dir, Some(dir) if dir.as_os_str().is_empty()) {
            return Err("Jobs directory cannot be empty".to_string());
        }
        if matches!(&self.cache_dir, Some(dir) if dir.as_os_str().is_empty()) {
            return Err("Cache directory cannot be empty".to_string());
        }
        if self.aoi_radius_m == 0 {
            return Err("AOI radius must be greater than zero".to_string());
        }
        if self.generator_version.trim().is_empty() {
            return Err("Generator version cannot be empty".to_string());
        }
        Ok(())
    }
}

/// HTTP control panel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Generator(String),
    Server(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Generator(msg) => write!(f, "Generator: {}", msg),
            ValidationError::Server(msg) => write!(f, "Server: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl HemsConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.generator.validate() {
            errors.push(ValidationError::Generator(e));
        }
        if self.server.host.trim().is_empty() {
            errors.push(ValidationError::Server("Host cannot be empty".to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every failure into one `ApiError`.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }
}
