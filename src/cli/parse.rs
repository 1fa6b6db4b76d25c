//! CLI parse: clap types for hems. No behavior; definitions only.

use crate::job::Quality;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// hems CLI - helipad scenery package generation
#[derive(Parser)]
#[command(name = "hems")]
#[command(about = "Generate hospital helipad scenery packages with cached, reproducible builds")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate scenery packages for a batch of sites
    Generate(GenerateArgs),
    /// Inspect persisted jobs
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Inspect the build cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Write the default workspace configuration
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Start the HTTP control panel
    Serve {
        /// Listen host (default from config)
        #[arg(long)]
        host: Option<String>,
        /// Listen port (default from config)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// FAA identifiers, comma or whitespace separated
    #[arg(long)]
    pub ids: Option<String>,

    /// CSV file with faa_id, name, lat, lon columns
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Output directory for packages (default from config)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Jobs directory (default: <output>/jobs)
    #[arg(long)]
    pub jobs_dir: Option<PathBuf>,

    /// Build cache directory (default: <output>/cache)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Area-of-interest radius in meters for new jobs
    #[arg(long)]
    pub aoi_radius: Option<u32>,

    /// Output quality for new jobs (low, medium, high)
    #[arg(long)]
    pub quality: Option<Quality>,

    /// Parked car density for new jobs (0.0 - 1.0)
    #[arg(long)]
    pub cars_density: Option<f64>,

    /// Night lighting strength for new jobs (0.0 - 1.0)
    #[arg(long)]
    pub night_lighting: Option<f64>,

    /// JSON file of job overrides applied to every site
    #[arg(long)]
    pub overrides: Option<PathBuf>,

    /// Skip the dated bulk archive
    #[arg(long)]
    pub no_bulk: bool,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Subcommand)]
pub enum JobCommands {
    /// Show a persisted job with its resolved attributes and cache key
    Show {
        /// Site identifier
        id: String,
        /// Site name (selects the job when several share an identifier)
        #[arg(long)]
        name: Option<String>,
        /// Jobs directory (default from config)
        #[arg(long)]
        jobs_dir: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Print the cache key the next build of a persisted job would use
    Key {
        /// Site identifier
        id: String,
        /// Site name (selects the job when several share an identifier)
        #[arg(long)]
        name: Option<String>,
        /// Jobs directory (default from config)
        #[arg(long)]
        jobs_dir: Option<PathBuf>,
    },
}
