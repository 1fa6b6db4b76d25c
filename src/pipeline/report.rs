use crate::error::{DownstreamError, JobError, SiteError};
use crate::resolve::ResolvedAttributes;
use crate::site::Site;
use serde::Serialize;
use std::path::PathBuf;

/// A packaged site.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub identifier: String,
    pub slug: String,
    pub zip_path: PathBuf,
    pub job_path: PathBuf,
    pub scene_path: PathBuf,
    pub package_dir: PathBuf,
    /// Hex digest; absent when the job could not be keyed
    pub cache_key: Option<String>,
    pub cache_hit: bool,
    pub resolved: ResolvedAttributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The site itself cannot be addressed on disk
    Input,
    Job,
    Downstream,
}

/// A site that did not produce a package.
#[derive(Debug, Clone, Serialize)]
pub struct SiteFailure {
    pub identifier: String,
    pub slug: String,
    pub kind: FailureKind,
    pub message: String,
}

impl SiteFailure {
    pub fn new(site: &Site, error: &SiteError) -> Self {
        let kind = match error {
            SiteError::Job(JobError::InvalidIdentifier { .. })
            | SiteError::Downstream(DownstreamError::UnsafeName { .. }) => FailureKind::Input,
            SiteError::Job(_) => FailureKind::Job,
            SiteError::Downstream(_) => FailureKind::Downstream,
        };
        Self {
            identifier: site.identifier.clone(),
            slug: site.slug.clone(),
            kind,
            message: error.to_string(),
        }
    }
}

/// Terminal state of one site.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SiteOutcome {
    Packaged(PipelineResult),
    Failed(SiteFailure),
}

impl SiteOutcome {
    pub fn identifier(&self) -> &str {
        match self {
            SiteOutcome::Packaged(result) => &result.identifier,
            SiteOutcome::Failed(failure) => &failure.identifier,
        }
    }
}

/// Outcomes for every requested site, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<SiteOutcome>,
}

impl BatchReport {
    pub fn packaged(&self) -> impl Iterator<Item = &PipelineResult> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            SiteOutcome::Packaged(result) => Some(result),
            SiteOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &SiteFailure> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            SiteOutcome::Packaged(_) => None,
            SiteOutcome::Failed(failure) => Some(failure),
        })
    }

    pub fn packaged_count(&self) -> usize {
        self.packaged().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn cache_hits(&self) -> usize {
        self.packaged().filter(|result| result.cache_hit).count()
    }
}
