//! Build cache storage

use crate::atomic::write_atomic;
use crate::cache::key::CacheKey;
use crate::error::CacheError;
use crate::job::Job;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SCENE_ARTIFACT: &str = "scene.json";
pub const BUILDINGS_ARTIFACT: &str = "buildings.json";
pub const PARKING_ARTIFACT: &str = "parking.json";
pub const LIGHTS_ARTIFACT: &str = "lights.json";
pub const OVERLAY_ARTIFACT: &str = "dsf_stub.txt";

/// Every artifact a complete entry must hold.
pub const ARTIFACTS: [&str; 5] = [
    SCENE_ARTIFACT,
    BUILDINGS_ARTIFACT,
    PARKING_ARTIFACT,
    LIGHTS_ARTIFACT,
    OVERLAY_ARTIFACT,
];

/// Scaffolding directories kept for future data sources.
pub const RESERVED_DIRS: [&str; 3] = ["geo", "elev", "imagery"];

const BUILD_DIR: &str = "build";

/// A complete cache entry on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub dir: PathBuf,
}

impl CacheEntry {
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn scene_path(&self) -> PathBuf {
        self.artifact_path(SCENE_ARTIFACT)
    }

    pub fn overlay_path(&self) -> PathBuf {
        self.artifact_path(OVERLAY_ARTIFACT)
    }
}

/// Result of probing the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(CacheEntry),
    /// Lists the artifacts that were absent or empty
    Miss { missing: Vec<&'static str> },
}

/// Filesystem build cache rooted at a cache directory.
#[derive(Debug, Clone)]
pub struct BuildCache {
    root: PathBuf,
}

impl BuildCache {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the reserved scaffolding and the build directory.
    pub fn ensure_layout(&self) -> Result<(), CacheError> {
        for dir in RESERVED_DIRS.iter().chain(std::iter::once(&BUILD_DIR)) {
            let path = self.root.join(dir);
            fs::create_dir_all(&path).map_err(|e| CacheError::Write { path, source: e })?;
        }
        Ok(())
    }

    /// `{root}/build/build_{hex}`
    pub fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(BUILD_DIR)
            .join(format!("build_{}", key.to_hex()))
    }

    /// Hit only when every artifact exists and is non-empty.
    pub fn lookup(&self, key: &CacheKey) -> CacheLookup {
        let dir = self.entry_dir(key);
        let missing: Vec<&'static str> = ARTIFACTS
            .iter()
            .copied()
            .filter(|name| {
                fs::metadata(dir.join(name))
                    .map(|meta| !meta.is_file() || meta.len() == 0)
                    .unwrap_or(true)
            })
            .collect();

        if missing.is_empty() {
            CacheLookup::Hit(CacheEntry { key: *key, dir })
        } else {
            CacheLookup::Miss { missing }
        }
    }

    /// Write every artifact for `key`. Rewriting an entry with the same
    /// content leaves it unchanged.
    pub fn store(
        &self,
        key: &CacheKey,
        scene_json: &str,
        overlay_stub: &str,
        job: &Job,
    ) -> Result<CacheEntry, CacheError> {
        let dir = self.entry_dir(key);
        fs::create_dir_all(&dir).map_err(|e| CacheError::Write {
            path: dir.clone(),
            source: e,
        })?;

        let buildings = json!({
            "footprint_source": job.hospital.footprint_source,
            "footprint_override": job.hospital.footprint_override,
            "roof_type": job.hospital.roof_type,
            "floors": job.hospital.floors,
            "height_m": job.hospital.height_m,
            "area_m2": job.hospital.area_m2,
        });
        let parking = json!({
            "ground": job.ground,
            "props": job.props,
        });
        let lights = json!({
            "lighting": job.lighting,
            "helipad_lighting": job.helipad.lighting,
        });

        let artifacts: [(&str, String); 5] = [
            (BUILDINGS_ARTIFACT, pretty(&buildings)?),
            (PARKING_ARTIFACT, pretty(&parking)?),
            (LIGHTS_ARTIFACT, pretty(&lights)?),
            (OVERLAY_ARTIFACT, overlay_stub.to_string()),
            (SCENE_ARTIFACT, scene_json.to_string()),
        ];

        for (name, content) in artifacts.iter() {
            let path = dir.join(name);
            write_atomic(&path, content.as_bytes())
                .map_err(|e| CacheError::Write { path, source: e })?;
        }

        debug!(key = %key, dir = %dir.display(), "Stored build cache entry");
        Ok(CacheEntry { key: *key, dir })
    }

    /// Copy the cached scene and overlay stub verbatim into a site's output tree.
    ///
    /// The overlay destination is supplied by the caller, which derives it
    /// from the site's coordinates rather than from the key.
    pub fn hydrate(
        &self,
        entry: &CacheEntry,
        destination_scene_path: &Path,
        destination_overlay_path: &Path,
    ) -> Result<(), CacheError> {
        copy_artifact(&entry.scene_path(), destination_scene_path)?;
        copy_artifact(&entry.overlay_path(), destination_overlay_path)?;
        debug!(key = %entry.key, "Hydrated outputs from build cache");
        Ok(())
    }
}

fn pretty(value: &serde_json::Value) -> Result<String, CacheError> {
    serde_json::to_string_pretty(value).map_err(|e| CacheError::Serialize(e.to_string()))
}

fn copy_artifact(source: &Path, destination: &Path) -> Result<(), CacheError> {
    let bytes = fs::read(source).map_err(|e| CacheError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;
    write_atomic(destination, &bytes).map_err(|e| CacheError::Write {
        path: destination.to_path_buf(),
        source: e,
    })
}
