//! Job persistence
//!
//! Jobs are addressed by identity, never by content: the same site always maps
//! to `{root}/{identifier}_{slug}/hospital_job.json`.

use crate::atomic::write_atomic;
use crate::error::JobError;
use crate::job::model::Job;
use crate::job::overrides::JobOverrides;
use crate::site::{normalize_identifier, Site};
use crate::types::Location;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const JOB_FILE_NAME: &str = "hospital_job.json";

/// A job together with where it lives.
#[derive(Debug, Clone)]
pub struct StoredJob {
    pub job: Job,
    pub path: PathBuf,
    /// `true` when the job did not exist and was just written with defaults
    pub created: bool,
}

/// Filesystem-backed job store rooted at a jobs directory.
#[derive(Debug, Clone)]
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical job path for a site. The stem must stay one directory
    /// below the root.
    pub fn job_path(&self, site: &Site) -> Result<PathBuf, JobError> {
        site.validate().map_err(|reason| JobError::InvalidIdentifier {
            identifier: site.identifier.clone(),
            reason,
        })?;
        Ok(self.root.join(site.stem()).join(JOB_FILE_NAME))
    }

    /// Load the persisted job for `site`, or create and persist a default one.
    pub fn resolve_or_create(
        &self,
        site: &Site,
        default_location: Location,
        default_aoi_radius_m: u32,
    ) -> Result<StoredJob, JobError> {
        self.resolve_or_create_with(
            site,
            default_location,
            default_aoi_radius_m,
            &JobOverrides::default(),
        )
    }

    /// Like `resolve_or_create`, but `new_job_overrides` seed a newly created
    /// job. Existing jobs are returned unchanged.
    pub fn resolve_or_create_with(
        &self,
        site: &Site,
        default_location: Location,
        default_aoi_radius_m: u32,
        new_job_overrides: &JobOverrides,
    ) -> Result<StoredJob, JobError> {
        let path = self.job_path(site)?;

        if path.exists() {
            let job = self.load(&path)?;
            if job.site() != *site {
                return Err(JobError::Corrupt {
                    path,
                    reason: format!(
                        "job identity {}_{} does not match site {}",
                        job.id,
                        job.name,
                        site.stem()
                    ),
                });
            }
            debug!(site = %site.identifier, path = %path.display(), "Loaded existing job");
            return Ok(StoredJob {
                job,
                path,
                created: false,
            });
        }

        let job = Job::new(site, default_location, default_aoi_radius_m)
            .with_overrides(new_job_overrides);
        let path = self.persist(&job)?;
        info!(site = %site.identifier, path = %path.display(), "Created default job");

        Ok(StoredJob {
            job,
            path,
            created: true,
        })
    }

    /// Read and parse a job file.
    pub fn load(&self, path: &Path) -> Result<Job, JobError> {
        let text = fs::read_to_string(path).map_err(|e| JobError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&text).map_err(|e| JobError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Serialize the full job to its canonical path, replacing prior content.
    pub fn persist(&self, job: &Job) -> Result<PathBuf, JobError> {
        let path = self.job_path(&job.site())?;

        let mut text = serde_json::to_string_pretty(job).map_err(|e| JobError::Corrupt {
            path: path.clone(),
            reason: format!("failed to serialize job: {}", e),
        })?;
        text.push('\n');

        write_atomic(&path, text.as_bytes()).map_err(|e| JobError::Io {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    /// Every persisted job whose `id` matches `identifier`, ordered by path.
    ///
    /// Directory names only narrow the search; the identity stored in each
    /// file decides the match, since identifiers may contain `_`.
    pub fn find_by_identifier(&self, identifier: &str) -> Result<Vec<StoredJob>, JobError> {
        let identifier = normalize_identifier(identifier);
        let prefix = format!("{}_", identifier);

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(JobError::Io {
                    path: self.root.clone(),
                    source: e,
                })
            }
        };

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path().join(JOB_FILE_NAME))
            .filter(|path| path.is_file())
            .collect();
        candidates.sort();

        let mut found = Vec::new();
        for path in candidates {
            let job = self.load(&path)?;
            if job.id == identifier {
                found.push(StoredJob {
                    job,
                    path,
                    created: false,
                });
            }
        }
        Ok(found)
    }
}
