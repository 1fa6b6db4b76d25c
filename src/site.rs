//! Site identity and normalization
//!
//! A site is one identifier plus a filesystem-safe slug of its display name.
//! Sites are derived once per batch run from whatever source supplied them
//! (CLI arguments, CSV rows, HTTP bodies).

use crate::types::Location;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path};
use tracing::warn;
use unicode_normalization::UnicodeNormalization;

/// Name used when no display name was supplied or the name slugifies to nothing.
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// One site to generate for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Site {
    /// Upper-cased identifier (FAA-style)
    pub identifier: String,
    /// Filesystem-safe slug of the display name
    pub slug: String,
}

impl Site {
    /// Build a site, normalizing both the identifier and the name.
    pub fn new(identifier: &str, name: &str) -> Self {
        Self {
            identifier: normalize_identifier(identifier),
            slug: slugify(name),
        }
    }

    /// `{identifier}_{slug}`, the stem shared by job directories and archives.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.identifier, self.slug)
    }

    /// Check that the site can be used as a single path component below a
    /// jobs or output root.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_identifier(&self.identifier) {
            return Err("only A-Z, 0-9, '-' and '_' are allowed".to_string());
        }
        if !is_single_component(&self.stem()) {
            return Err(format!("{:?} is not a plain directory name", self.stem()));
        }
        Ok(())
    }
}

/// Raw site tuple as supplied by an input source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteRequest {
    pub identifier: String,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl SiteRequest {
    pub fn id_only(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    fn location(&self) -> Option<Location> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Location::new(lat, lon)),
            _ => None,
        }
    }
}

/// Sites in input order plus whatever coordinates the inputs supplied.
#[derive(Debug, Clone, Default)]
pub struct SiteBatch {
    pub sites: Vec<Site>,
    pub coordinates: HashMap<String, Location>,
}

impl SiteBatch {
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn coordinates_for(&self, site: &Site) -> Option<Location> {
        self.coordinates.get(&site.identifier).copied()
    }
}

pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_uppercase()
}

/// Identifiers end up in directory and archive names.
pub fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `true` when `name` joins onto a root as exactly one normal component.
pub fn is_single_component(name: &str) -> bool {
    if name.contains('\0') {
        return false;
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => part.to_str() == Some(name),
        _ => false,
    }
}

/// Return a filesystem-friendly slug.
///
/// Anything other than alphanumerics, `-` and `_` becomes `_`; runs of `_`
/// collapse and edge underscores are trimmed. Empty results map to `UNKNOWN`.
pub fn slugify(value: &str) -> String {
    let cleaned: String = value
        .nfc()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let slug = cleaned
        .split('_')
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if slug.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        slug
    }
}

/// Split a free-form identifier list on commas and whitespace.
pub fn parse_identifier_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize and de-duplicate requests.
///
/// First occurrence fixes the order. Later duplicates only fill in a name or
/// coordinates the first occurrence lacked. Identifiers that cannot name a
/// directory are kept so the pipeline can fail them individually.
pub fn resolve_sites(requests: &[SiteRequest]) -> SiteBatch {
    let mut order: Vec<String> = Vec::new();
    let mut names: HashMap<String, String> = HashMap::new();
    let mut coordinates: HashMap<String, Location> = HashMap::new();

    for request in requests {
        let identifier = normalize_identifier(&request.identifier);
        if identifier.is_empty() {
            continue;
        }
        if !order.contains(&identifier) {
            if !is_valid_identifier(&identifier) {
                warn!(identifier = %identifier, "Identifier is not filesystem safe; site will fail");
            }
            order.push(identifier.clone());
        }
        if let Some(name) = request.name.as_deref().map(str::trim) {
            if !name.is_empty() {
                names.entry(identifier.clone()).or_insert_with(|| name.to_string());
            }
        }
        if let Some(location) = request.location() {
            coordinates.entry(identifier).or_insert(location);
        }
    }

    let sites = order
        .into_iter()
        .map(|identifier| {
            let name = names
                .get(&identifier)
                .map(String::as_str)
                .unwrap_or(UNKNOWN_NAME);
            Site {
                slug: slugify(name),
                identifier,
            }
        })
        .collect();

    SiteBatch { sites, coordinates }
}
