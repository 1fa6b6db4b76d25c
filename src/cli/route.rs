//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cache::key_for;
use crate::cli::parse::{CacheCommands, Commands, GenerateArgs, JobCommands};
use crate::cli::presentation::{
    format_batch_json, format_batch_text, format_init_summary, format_job_json, format_job_text,
};
use crate::config::{ConfigLoader, GeneratorConfig, HemsConfig};
use crate::error::ApiError;
use crate::init::initialize_workspace;
use crate::input::{read_csv_file, requests_from_identifiers};
use crate::job::{
    JobOverrides, JobStore, LightingOverrides, OutputOverrides, PropsOverrides, StoredJob,
};
use crate::package::write_bulk_archive;
use crate::pipeline::{BatchOptions, BatchReport, Pipeline};
use crate::resolve::resolve;
use crate::server::{self, ServerState};
use crate::site::{resolve_sites, Site};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Rendered command result. `failed` marks partial failures that still
/// produced output, so the binary can exit non-zero after printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub failed: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            failed: false,
        }
    }
}

/// Runtime context for CLI execution: workspace root and loaded config.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: HemsConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        config.ensure_valid()?;

        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &HemsConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Generate(args) => self.handle_generate(args),
            Commands::Job { command } => match command {
                JobCommands::Show {
                    id,
                    name,
                    jobs_dir,
                    format,
                } => self
                    .handle_job_show(id, name.as_deref(), jobs_dir.as_deref(), format)
                    .map(CommandOutput::ok),
            },
            Commands::Cache { command } => match command {
                CacheCommands::Key { id, name, jobs_dir } => self
                    .handle_cache_key(id, name.as_deref(), jobs_dir.as_deref())
                    .map(CommandOutput::ok),
            },
            Commands::Init { force } => {
                let outcome = initialize_workspace(&self.workspace_root, *force)?;
                Ok(CommandOutput::ok(format_init_summary(&outcome)))
            }
            Commands::Serve { host, port } => self
                .handle_serve(host.clone(), *port)
                .map(CommandOutput::ok),
        }
    }

    /// Config directories anchored at the workspace root.
    fn workspace_generator(&self) -> GeneratorConfig {
        let anchor = |path: &Path| -> PathBuf {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.workspace_root.join(path)
            }
        };
        let generator = &self.config.generator;
        GeneratorConfig {
            output_dir: anchor(&generator.output_dir),
            jobs_dir: generator.jobs_dir.as_deref().map(anchor),
            cache_dir: generator.cache_dir.as_deref().map(anchor),
            aoi_radius_m: generator.aoi_radius_m,
            generator_version: generator.generator_version.clone(),
        }
    }

    fn generator_for(&self, args: &GenerateArgs) -> Result<GeneratorConfig, ApiError> {
        let mut generator = self.workspace_generator();
        if let Some(ref output) = args.output {
            generator.output_dir = output.clone();
        }
        if let Some(ref jobs_dir) = args.jobs_dir {
            generator.jobs_dir = Some(jobs_dir.clone());
        }
        if let Some(ref cache_dir) = args.cache_dir {
            generator.cache_dir = Some(cache_dir.clone());
        }
        if let Some(radius) = args.aoi_radius {
            generator.aoi_radius_m = radius;
        }
        generator.validate().map_err(ApiError::ConfigError)?;
        Ok(generator)
    }

    fn handle_generate(&self, args: &GenerateArgs) -> Result<CommandOutput, ApiError> {
        let mut requests = Vec::new();
        if let Some(ref ids) = args.ids {
            requests.extend(requests_from_identifiers(ids));
        }
        if let Some(ref csv) = args.csv {
            requests.extend(read_csv_file(csv)?);
        }
        let batch = resolve_sites(&requests);

        let options = BatchOptions {
            overrides: match args.overrides {
                Some(ref path) => load_overrides(path)?,
                None => JobOverrides::default(),
            },
            new_job_overrides: new_job_overrides(args)?,
        };
        let generator = self.generator_for(args)?;
        let output_dir = generator.output_dir.clone();

        let report = Pipeline::new(generator).run_batch(&batch, &options)?;

        let mut failed = report.has_failures();
        let mut bulk_archive = None;
        if !args.no_bulk && report.packaged_count() > 0 {
            match write_bulk(&output_dir, &report) {
                Ok(path) => {
                    info!(path = %path.display(), "Bulk archive written");
                    bulk_archive = Some(path);
                }
                Err(e) => {
                    error!(error = %e, "Bulk archive failed");
                    eprintln!("Bulk archive failed: {}", e);
                    failed = true;
                }
            }
        }

        let text = if args.format == "json" {
            format_batch_json(&report, bulk_archive.as_deref())?
        } else {
            format_batch_text(&report, bulk_archive.as_deref())
        };
        Ok(CommandOutput { text, failed })
    }

    fn handle_job_show(
        &self,
        id: &str,
        name: Option<&str>,
        jobs_dir: Option<&Path>,
        format: &str,
    ) -> Result<String, ApiError> {
        let store = self.job_store(jobs_dir);
        let stored = find_job(&store, id, name)?;
        let resolved = resolve(&stored.job);
        let key = key_for(
            &stored.job.pinned(&resolved),
            &self.config.generator.generator_version,
        )
        .ok()
        .map(|k| k.to_hex());

        if format == "json" {
            format_job_json(&stored, &resolved, key.as_deref())
        } else {
            format_job_text(&stored, &resolved, key.as_deref())
        }
    }

    fn handle_cache_key(
        &self,
        id: &str,
        name: Option<&str>,
        jobs_dir: Option<&Path>,
    ) -> Result<String, ApiError> {
        let store = self.job_store(jobs_dir);
        let stored = find_job(&store, id, name)?;
        let resolved = resolve(&stored.job);
        let key = key_for(
            &stored.job.pinned(&resolved),
            &self.config.generator.generator_version,
        )
        .map_err(|e| ApiError::InputError(format!("Cannot key job {}: {}", id, e)))?;
        Ok(key.to_hex())
    }

    fn handle_serve(&self, host: Option<String>, port: Option<u16>) -> Result<String, ApiError> {
        let mut server_config = self.config.server.clone();
        if let Some(host) = host {
            server_config.host = host;
        }
        if let Some(port) = port {
            server_config.port = port;
        }
        let state = ServerState {
            base_dir: self.workspace_root.clone(),
            generator: self.workspace_generator(),
        };

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime
            .block_on(server::serve(&server_config, state))
            .map_err(|e| ApiError::ServerError(format!("{:#}", e)))?;
        Ok("Server stopped".to_string())
    }

    fn job_store(&self, jobs_dir: Option<&Path>) -> JobStore {
        match jobs_dir {
            Some(dir) => JobStore::new(dir),
            None => JobStore::new(self.workspace_generator().jobs_root()),
        }
    }
}

fn load_overrides(path: &Path) -> Result<JobOverrides, ApiError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ApiError::InputError(format!("Cannot read overrides {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        ApiError::InputError(format!("Invalid overrides in {}: {}", path.display(), e))
    })
}

/// Job defaults from flags; only applied when a site's job is first created.
fn new_job_overrides(args: &GenerateArgs) -> Result<JobOverrides, ApiError> {
    let unit = |flag: &str, value: Option<f64>| -> Result<Option<f64>, ApiError> {
        match value {
            Some(v) if !(0.0..=1.0).contains(&v) => Err(ApiError::InputError(format!(
                "--{} must be between 0.0 and 1.0, got {}",
                flag, v
            ))),
            other => Ok(other),
        }
    };
    let cars_density = unit("cars-density", args.cars_density)?;
    let night_strength = unit("night-lighting", args.night_lighting)?;

    Ok(JobOverrides {
        props: cars_density.map(|cars_density| PropsOverrides {
            cars_density: Some(cars_density),
            ..Default::default()
        }),
        lighting: night_strength.map(|night_strength| LightingOverrides {
            night_strength: Some(night_strength),
            ..Default::default()
        }),
        output: args.quality.map(|quality| OutputOverrides {
            quality: Some(quality),
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Locate one persisted job. With a name the path is derived directly;
/// without one the identifier must match exactly one job.
fn find_job(store: &JobStore, id: &str, name: Option<&str>) -> Result<StoredJob, ApiError> {
    if let Some(name) = name {
        let site = Site::new(id, name);
        let path = store
            .job_path(&site)
            .map_err(|e| ApiError::InputError(e.to_string()))?;
        if !path.is_file() {
            return Err(ApiError::InputError(format!(
                "No job for {} at {}",
                site.stem(),
                path.display()
            )));
        }
        let job = store.load(&path)?;
        return Ok(StoredJob {
            job,
            path,
            created: false,
        });
    }

    let mut found = store.find_by_identifier(id)?;
    match found.len() {
        0 => Err(ApiError::InputError(format!(
            "No job for {} under {}",
            id,
            store.root().display()
        ))),
        1 => Ok(found.remove(0)),
        _ => {
            let names: Vec<String> = found.iter().map(|s| s.job.name.clone()).collect();
            Err(ApiError::InputError(format!(
                "Several jobs match {}: {}. Pass --name to choose one.",
                id,
                names.join(", ")
            )))
        }
    }
}

fn write_bulk(output_dir: &Path, report: &BatchReport) -> Result<PathBuf, ApiError> {
    let package_dirs: Vec<PathBuf> = report
        .packaged()
        .map(|result| result.package_dir.clone())
        .collect();
    Ok(write_bulk_archive(output_dir, &package_dirs)?)
}
