//! CLI presentation: text and json formatters per command.

use crate::error::{ApiError, DownstreamError};
use crate::init::InitOutcome;
use crate::job::StoredJob;
use crate::pipeline::{BatchReport, SiteOutcome};
use crate::resolve::ResolvedAttributes;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use std::path::Path;

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::Downstream(DownstreamError::Serialize(e.to_string())))
}

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Per-site table followed by a one-line summary.
pub fn format_batch_text(report: &BatchReport, bulk_archive: Option<&Path>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Generation")));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Site", "Status", "Cache", "Archive / Error"]);
    for outcome in &report.outcomes {
        match outcome {
            SiteOutcome::Packaged(result) => {
                let cache = if result.cache_hit { "hit" } else { "miss" };
                table.add_row(vec![
                    format!("{} {}", result.identifier, result.slug),
                    format!("{}", "packaged".green()),
                    cache.to_string(),
                    result.zip_path.display().to_string(),
                ]);
            }
            SiteOutcome::Failed(failure) => {
                table.add_row(vec![
                    format!("{} {}", failure.identifier, failure.slug),
                    format!("{}", "failed".red()),
                    "-".to_string(),
                    failure.message.clone(),
                ]);
            }
        }
    }
    out.push_str(&format!("{}\n\n", table));

    out.push_str(&format!(
        "{} packaged ({} from cache), {} failed\n",
        report.packaged_count(),
        report.cache_hits(),
        report.failed_count()
    ));
    if let Some(bulk) = bulk_archive {
        out.push_str(&format!("Bulk archive: {}\n", bulk.display()));
    }
    out
}

pub fn format_batch_json(
    report: &BatchReport,
    bulk_archive: Option<&Path>,
) -> Result<String, ApiError> {
    to_pretty_json(&json!({
        "outcomes": report.outcomes,
        "packaged": report.packaged_count(),
        "failed": report.failed_count(),
        "cache_hits": report.cache_hits(),
        "bulk_archive": bulk_archive,
    }))
}

pub fn format_job_text(
    stored: &StoredJob,
    resolved: &ResolvedAttributes,
    cache_key: Option<&str>,
) -> Result<String, ApiError> {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Job {} {}", stored.job.id, stored.job.name))
    ));
    out.push_str(&format!("  Path: {}\n", stored.path.display()));
    out.push_str(&format!(
        "  Location: {:.6}, {:.6}\n",
        stored.job.location.lat, stored.job.location.lon
    ));
    out.push_str(&format!("  Floors: {}\n", resolved.floors));
    out.push_str(&format!("  Height: {:.1} m\n", resolved.height_m));
    out.push_str(&format!(
        "  Helipad: {:.6}, {:.6}\n",
        resolved.helipad.lat, resolved.helipad.lon
    ));
    out.push_str(&format!("  Cache key: {}\n\n", cache_key.unwrap_or("-")));
    out.push_str(&to_pretty_json(&stored.job)?);
    Ok(out)
}

pub fn format_job_json(
    stored: &StoredJob,
    resolved: &ResolvedAttributes,
    cache_key: Option<&str>,
) -> Result<String, ApiError> {
    to_pretty_json(&json!({
        "path": stored.path,
        "job": stored.job,
        "resolved": resolved,
        "cache_key": cache_key,
    }))
}

pub fn format_init_summary(outcome: &InitOutcome) -> String {
    match outcome {
        InitOutcome::Created(path) => format!("Wrote default config to {}", path.display()),
        InitOutcome::Skipped(path) => format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ),
    }
}
