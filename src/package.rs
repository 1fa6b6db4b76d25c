//! Scenery package layout and archive assembly.

use crate::atomic::write_atomic;
use crate::error::DownstreamError;
use crate::site::Site;
use crate::writers::OVERLAY_DIR;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const PACKAGE_PREFIX: &str = "HOSP";
pub const SCENE_FILE: &str = "scene.json";

/// Output layout for one site:
///
/// ```text
/// {output}/HOSP_{id}_{slug}/objects/
///                          /polygons/
///                          /Earth nav data/
///                          /scene.json
/// {output}/HOSP_{id}_{slug}.zip
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SceneryPackage {
    pub identifier: String,
    pub slug: String,
    pub output_dir: PathBuf,
}

impl SceneryPackage {
    /// Layout for `site` below `output_dir`. Fails when the site would not
    /// name a single directory directly under the output root.
    pub fn for_site(site: &Site, output_dir: &Path) -> Result<Self, DownstreamError> {
        site.validate().map_err(|reason| DownstreamError::UnsafeName {
            name: site.stem(),
            reason,
        })?;
        Ok(Self {
            identifier: site.identifier.clone(),
            slug: site.slug.clone(),
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn dir_name(&self) -> String {
        format!("{}_{}_{}", PACKAGE_PREFIX, self.identifier, self.slug)
    }

    /// Scenery root of the package
    pub fn package_dir(&self) -> PathBuf {
        self.output_dir.join(self.dir_name())
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.package_dir().join("objects")
    }

    pub fn polygons_dir(&self) -> PathBuf {
        self.package_dir().join("polygons")
    }

    pub fn scene_path(&self) -> PathBuf {
        self.package_dir().join(SCENE_FILE)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.zip", self.dir_name()))
    }

    pub fn build_skeleton(&self) -> Result<(), DownstreamError> {
        for dir in [
            self.objects_dir(),
            self.polygons_dir(),
            self.package_dir().join(OVERLAY_DIR),
        ] {
            fs::create_dir_all(&dir).map_err(|e| DownstreamError::io(&dir, e))?;
        }
        Ok(())
    }

    pub fn write_scene(&self, scene_json: &str) -> Result<PathBuf, DownstreamError> {
        let path = self.scene_path();
        write_atomic(&path, scene_json.as_bytes()).map_err(|e| DownstreamError::io(&path, e))?;
        Ok(path)
    }
}

/// Turns an output directory tree into a distributable archive.
pub trait Packager: Send + Sync {
    /// Archive `source_dir` at `archive_path`. Entry names are relative to
    /// `source_dir`'s parent so the top-level directory is kept.
    fn package(&self, source_dir: &Path, archive_path: &Path) -> Result<(), DownstreamError>;
}

/// Deflate zip packager. Entries are added in sorted order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipPackager;

impl Packager for ZipPackager {
    fn package(&self, source_dir: &Path, archive_path: &Path) -> Result<(), DownstreamError> {
        let base = source_dir.parent().unwrap_or(source_dir);
        write_archive(base, &[source_dir.to_path_buf()], archive_path)
    }
}

/// Zip every directory in `sources` into `archive_path`, naming entries
/// relative to `base`.
///
/// The archive is assembled in a temp file and renamed on success.
pub fn write_archive(
    base: &Path,
    sources: &[PathBuf],
    archive_path: &Path,
) -> Result<(), DownstreamError> {
    if let Some(parent) = archive_path.parent() {
        fs::create_dir_all(parent).map_err(|e| DownstreamError::io(parent, e))?;
    }

    let temp_path = crate::atomic::temp_path_for(archive_path);
    let result = write_archive_to(base, sources, &temp_path, archive_path);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
        return result;
    }

    fs::rename(&temp_path, archive_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        DownstreamError::io(archive_path, e)
    })
}

fn write_archive_to(
    base: &Path,
    sources: &[PathBuf],
    temp_path: &Path,
    archive_path: &Path,
) -> Result<(), DownstreamError> {
    let archive_err = |reason: String| DownstreamError::Archive {
        path: archive_path.to_path_buf(),
        reason,
    };

    let file = File::create(temp_path).map_err(|e| DownstreamError::io(temp_path, e))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for source in sources {
        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry.map_err(|e| archive_err(e.to_string()))?;
            let path = entry.path();
            let name = entry_name(base, path).ok_or_else(|| {
                archive_err(format!("{} is not inside {}", path.display(), base.display()))
            })?;

            if entry.file_type().is_dir() {
                zip.add_directory(format!("{}/", name), options)
                    .map_err(|e| archive_err(e.to_string()))?;
            } else if entry.file_type().is_file() {
                zip.start_file(name, options)
                    .map_err(|e| archive_err(e.to_string()))?;
                let mut input = File::open(path).map_err(|e| DownstreamError::io(path, e))?;
                io::copy(&mut input, &mut zip).map_err(|e| DownstreamError::io(path, e))?;
            }
        }
    }

    zip.finish().map_err(|e| archive_err(e.to_string()))?;
    Ok(())
}

/// `/`-joined path of `path` relative to `base`.
fn entry_name(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// `{prefix}_{YYYYMMDD}.zip` for today's local date.
pub fn dated_bulk_name(prefix: &str) -> String {
    format!("{}_{}.zip", prefix, chrono::Local::now().format("%Y%m%d"))
}

pub const BULK_PREFIX: &str = "BULK";

/// Bundle several package directories into one dated archive under
/// `output_dir`. Entries keep their `HOSP_…/` prefix.
pub fn write_bulk_archive(
    output_dir: &Path,
    package_dirs: &[PathBuf],
) -> Result<PathBuf, DownstreamError> {
    let archive_path = output_dir.join(dated_bulk_name(BULK_PREFIX));
    write_archive(output_dir, package_dirs, &archive_path)?;
    Ok(archive_path)
}
