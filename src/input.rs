//! Site input sources: identifier lists and CSV.
//!
//! CSV files carry a header row with `faa_id` (or `id`), `name`, `lat` and
//! `lon`. Extra columns are ignored.

use crate::error::ApiError;
use crate::site::{parse_identifier_list, SiteRequest};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    faa_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
}

/// One request per identifier in a comma/whitespace separated list.
pub fn requests_from_identifiers(raw: &str) -> Vec<SiteRequest> {
    parse_identifier_list(raw)
        .into_iter()
        .map(SiteRequest::id_only)
        .collect()
}

pub fn read_csv_file(path: &Path) -> Result<Vec<SiteRequest>, ApiError> {
    let file = File::open(path).map_err(|e| {
        ApiError::InputError(format!("Cannot open CSV {}: {}", path.display(), e))
    })?;
    read_csv(file, &path.display().to_string())
}

pub fn read_csv_str(data: &str) -> Result<Vec<SiteRequest>, ApiError> {
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    read_csv(data.as_bytes(), "request body")
}

/// Parse CSV rows into requests. Rows without an identifier are skipped;
/// blank or unparsable coordinates are left unset.
pub fn read_csv<R: Read>(reader: R, source: &str) -> Result<Vec<SiteRequest>, ApiError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut requests = Vec::new();
    for (index, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| ApiError::InputError(format!("Invalid CSV in {}: {}", source, e)))?;

        let identifier = non_blank(row.faa_id).or_else(|| non_blank(row.id));
        let Some(identifier) = identifier else {
            continue;
        };

        // header is line 1
        let line = index + 2;
        let lat = parse_coordinate(row.lat.as_deref(), "lat", line);
        let lon = parse_coordinate(row.lon.as_deref(), "lon", line);

        requests.push(SiteRequest {
            identifier,
            name: non_blank(row.name),
            lat,
            lon,
        });
    }
    Ok(requests)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_coordinate(value: Option<&str>, column: &str, line: usize) -> Option<f64> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(parsed),
        _ => {
            warn!(line, column, value, "Ignoring unparsable coordinate");
            None
        }
    }
}
