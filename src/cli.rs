//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{CacheCommands, Cli, Commands, GenerateArgs, JobCommands};
pub use presentation::{
    format_batch_json, format_batch_text, format_init_summary, format_job_json, format_job_text,
};
pub use route::{CommandOutput, RunContext};
