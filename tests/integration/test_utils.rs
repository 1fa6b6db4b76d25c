//! Shared test utilities for integration tests

use hems_scenery::config::GeneratorConfig;
use hems_scenery::job::Job;
use hems_scenery::resolve::ResolvedAttributes;
use hems_scenery::scene::{HelipadSceneBuilder, Scene, SceneBuilder};
use hems_scenery::site::{resolve_sites, SiteBatch, SiteRequest};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scene builder that counts invocations and delegates to the default builder.
#[derive(Clone, Default)]
pub struct CountingBuilder {
    calls: Arc<AtomicUsize>,
}

impl CountingBuilder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SceneBuilder for CountingBuilder {
    fn build(&self, job: &Job, resolved: &ResolvedAttributes) -> Scene {
        self.calls.fetch_add(1, Ordering::SeqCst);
        HelipadSceneBuilder.build(job, resolved)
    }
}

pub fn generator(output: &Path) -> GeneratorConfig {
    GeneratorConfig {
        generator_version: "hems-scenery/test".to_string(),
        ..GeneratorConfig::for_output(output)
    }
}

pub fn site(identifier: &str, name: &str, lat: f64, lon: f64) -> SiteRequest {
    SiteRequest {
        identifier: identifier.to_string(),
        name: Some(name.to_string()),
        lat: Some(lat),
        lon: Some(lon),
    }
}

pub fn batch(requests: &[SiteRequest]) -> SiteBatch {
    resolve_sites(requests)
}
