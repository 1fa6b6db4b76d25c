use crate::cache::{key_for, BuildCache, CacheKey, CacheLookup};
use crate::config::GeneratorConfig;
use crate::error::{DownstreamError, PipelineError, SiteError};
use crate::job::{JobOverrides, JobStore};
use crate::package::{Packager, SceneryPackage, ZipPackager};
use crate::pipeline::report::{BatchReport, PipelineResult, SiteFailure, SiteOutcome};
use crate::resolve::resolve;
use crate::scene::{
    HelipadSceneBuilder, SceneBuilder, HELIPAD_MARKER_OBJ, HELIPAD_MARKINGS_POL, HOSPITAL_OBJ,
};
use crate::site::{Site, SiteBatch};
use crate::types::Location;
use crate::writers::{
    render_overlay_stub, tile_for_location, write_helipad_markings_pol, write_overlay_text,
    write_simple_hospital_obj, write_simple_marker_obj,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, info_span, warn};

/// Per-run job adjustments.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Applied to every site's job, new or existing, and persisted
    pub overrides: JobOverrides,
    /// Seed values for jobs created during this run only
    pub new_job_overrides: JobOverrides,
}

/// Orchestrates job resolution, cache probing, scene building and packaging.
pub struct Pipeline {
    config: GeneratorConfig,
    jobs: JobStore,
    cache: BuildCache,
    builder: Box<dyn SceneBuilder>,
    packager: Box<dyn Packager>,
}

impl Pipeline {
    pub fn new(config: GeneratorConfig) -> Self {
        let jobs = JobStore::new(config.jobs_root());
        let cache = BuildCache::new(config.cache_root());
        Self {
            config,
            jobs,
            cache,
            builder: Box::new(HelipadSceneBuilder),
            packager: Box::new(ZipPackager),
        }
    }

    pub fn with_scene_builder(mut self, builder: impl SceneBuilder + 'static) -> Self {
        self.builder = Box::new(builder);
        self
    }

    pub fn with_packager(mut self, packager: impl Packager + 'static) -> Self {
        self.packager = Box::new(packager);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn job_store(&self) -> &JobStore {
        &self.jobs
    }

    pub fn cache(&self) -> &BuildCache {
        &self.cache
    }

    /// Run every site in `batch`, in order.
    ///
    /// Archive paths are checked for collisions before any site is touched.
    pub fn run_batch(
        &self,
        batch: &SiteBatch,
        options: &BatchOptions,
    ) -> Result<BatchReport, PipelineError> {
        if batch.is_empty() {
            return Err(PipelineError::NoSites);
        }
        planned_archive_paths(&batch.sites, &self.config)?;

        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|e| PipelineError::OutputDir {
            path: output_dir.clone(),
            source: e,
        })?;
        if let Err(e) = self.cache.ensure_layout() {
            warn!(error = %e, "Build cache unavailable; sites will be built uncached");
        }

        info!(
            sites = batch.sites.len(),
            output = %output_dir.display(),
            version = %self.config.generator_version,
            "Starting batch"
        );

        let mut report = BatchReport::default();
        for site in &batch.sites {
            let span = info_span!("site", site = %site.identifier);
            let _enter = span.enter();

            let outcome = match self.process_site(site, batch.coordinates_for(site), options) {
                Ok(result) => {
                    info!(
                        zip = %result.zip_path.display(),
                        cache_hit = result.cache_hit,
                        "Site packaged"
                    );
                    SiteOutcome::Packaged(result)
                }
                Err(e) => {
                    error!(error = %e, "Site failed");
                    SiteOutcome::Failed(SiteFailure::new(site, &e))
                }
            };
            report.outcomes.push(outcome);
        }

        info!(
            packaged = report.packaged_count(),
            failed = report.failed_count(),
            cache_hits = report.cache_hits(),
            "Batch finished"
        );
        Ok(report)
    }

    fn process_site(
        &self,
        site: &Site,
        coordinates: Option<Location>,
        options: &BatchOptions,
    ) -> Result<PipelineResult, SiteError> {
        let stored = self.jobs.resolve_or_create_with(
            site,
            coordinates.unwrap_or_default(),
            self.config.aoi_radius_m,
            &options.new_job_overrides,
        )?;
        if stored.created && coordinates.is_none() {
            warn!("No coordinates supplied; new job placed at 0,0");
        }

        let mut job = stored.job;
        if !options.overrides.is_empty() {
            job = job.with_overrides(&options.overrides);
        }

        let resolved = resolve(&job);
        let job = job.pinned(&resolved);
        let job_path = self.jobs.persist(&job)?;
        debug!(floors = resolved.floors, height_m = resolved.height_m, "Resolved attributes");

        let key = match key_for(&job, &self.config.generator_version) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "Could not compute cache key; building uncached");
                None
            }
        };

        let package = SceneryPackage::for_site(site, &self.config.output_dir)?;
        let package_dir = package.package_dir();
        if package_dir.exists() {
            fs::remove_dir_all(&package_dir).map_err(|e| DownstreamError::io(&package_dir, e))?;
        }
        package.build_skeleton()?;

        let scene_path = package.scene_path();
        let overlay_path = tile_for_location(job.location).file_path(&package_dir);

        let cache_hit = match key.as_ref() {
            Some(key) => self.try_hydrate(key, &scene_path, &overlay_path),
            None => false,
        };

        if !cache_hit {
            let scene = self.builder.build(&job, &resolved);
            let scene_json = scene
                .to_json()
                .map_err(|e| DownstreamError::Serialize(e.to_string()))?;
            let overlay_stub = render_overlay_stub(&scene);

            package.write_scene(&scene_json)?;
            write_overlay_text(&package_dir, job.location, &overlay_stub)?;

            if let Some(key) = key.as_ref() {
                if let Err(e) = self.cache.store(key, &scene_json, &overlay_stub, &job) {
                    warn!(key = %key, error = %e, "Cache store failed; output delivered uncached");
                }
            }
        }

        write_simple_hospital_obj(&package.objects_dir().join(HOSPITAL_OBJ))?;
        write_simple_marker_obj(&package.objects_dir().join(HELIPAD_MARKER_OBJ))?;
        write_helipad_markings_pol(&package.polygons_dir().join(HELIPAD_MARKINGS_POL))?;

        let zip_path = package.archive_path();
        self.packager.package(&package_dir, &zip_path)?;

        Ok(PipelineResult {
            identifier: site.identifier.clone(),
            slug: site.slug.clone(),
            zip_path,
            job_path,
            scene_path,
            package_dir,
            cache_key: key.map(|k| k.to_hex()),
            cache_hit,
            resolved,
        })
    }

    /// Hydrate from the cache; any failure degrades to a rebuild.
    fn try_hydrate(&self, key: &CacheKey, scene_path: &Path, overlay_path: &Path) -> bool {
        match self.cache.lookup(key) {
            CacheLookup::Hit(entry) => match self.cache.hydrate(&entry, scene_path, overlay_path) {
                Ok(()) => {
                    info!(key = %key, "Cache hit");
                    true
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Cache hydrate failed; rebuilding");
                    false
                }
            },
            CacheLookup::Miss { missing } => {
                info!(key = %key, missing = ?missing, "Cache miss");
                false
            }
        }
    }
}

/// Archive path for every packageable site, failing on the first pair that
/// would overwrite each other. Sites with unsafe names have no archive path;
/// they fail on their own when processed.
pub fn planned_archive_paths(
    sites: &[Site],
    config: &GeneratorConfig,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut seen: HashMap<PathBuf, &Site> = HashMap::new();
    let mut paths = Vec::with_capacity(sites.len());

    for site in sites {
        let Ok(package) = SceneryPackage::for_site(site, &config.output_dir) else {
            continue;
        };
        let path = package.archive_path();
        if let Some(first) = seen.get(&path) {
            return Err(PipelineError::PathCollision {
                path,
                first: first.identifier.clone(),
                second: site.identifier.clone(),
            });
        }
        seen.insert(path.clone(), site);
        paths.push(path);
    }
    Ok(paths)
}
