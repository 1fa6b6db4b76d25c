//! Cache reuse across pipeline runs

use hems_scenery::cache::{key_for, BuildCache, CacheLookup, ARTIFACTS};
use hems_scenery::job::{HospitalOverrides, Job, JobOverrides, JobStore, Policy};
use hems_scenery::pipeline::{BatchOptions, BatchReport, Pipeline, PipelineResult};
use hems_scenery::site::Site;
use std::fs;
use tempfile::TempDir;

use crate::integration::test_utils::{batch, generator, site, CountingBuilder};

fn only_result(report: &BatchReport) -> &PipelineResult {
    assert_eq!(report.outcomes.len(), 1);
    report.packaged().next().expect("site should be packaged")
}

#[test]
fn test_second_run_hits_cache_and_skips_builder() {
    let temp_dir = TempDir::new().unwrap();
    let builder = CountingBuilder::default();
    let pipeline = Pipeline::new(generator(temp_dir.path())).with_scene_builder(builder.clone());
    let sites = batch(&[site("12pa", "Mercy Hospital", 40.44, -79.99)]);

    let first = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    assert!(!only_result(&first).cache_hit);
    assert_eq!(builder.calls(), 1);

    let second = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    assert!(only_result(&second).cache_hit);
    assert_eq!(builder.calls(), 1, "cache hit must not invoke the builder");
    assert_eq!(
        only_result(&first).cache_key,
        only_result(&second).cache_key
    );
}

#[test]
fn test_scene_is_byte_identical_across_runs() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(generator(temp_dir.path()));
    let sites = batch(&[site("12PA", "Mercy Hospital", 40.44, -79.99)]);

    let first = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    let built = fs::read(&only_result(&first).scene_path).unwrap();

    let second = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    let hydrated = fs::read(&only_result(&second).scene_path).unwrap();

    assert!(only_result(&second).cache_hit);
    assert_eq!(built, hydrated);

    // a cold cache rebuilds the same bytes
    fs::remove_dir_all(temp_dir.path().join("cache")).unwrap();
    let third = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    assert!(!only_result(&third).cache_hit);
    assert_eq!(fs::read(&only_result(&third).scene_path).unwrap(), built);
}

#[test]
fn test_missing_artifact_forces_rebuild() {
    let temp_dir = TempDir::new().unwrap();
    let builder = CountingBuilder::default();
    let pipeline = Pipeline::new(generator(temp_dir.path())).with_scene_builder(builder.clone());
    let sites = batch(&[site("12PA", "Mercy Hospital", 40.44, -79.99)]);

    let first = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    let key_hex = only_result(&first).cache_key.clone().unwrap();

    let cache = BuildCache::new(temp_dir.path().join("cache"));
    let entry_dir = temp_dir.path().join("cache/build").join(format!("build_{}", key_hex));
    for artifact in ARTIFACTS {
        assert!(entry_dir.join(artifact).is_file(), "{} missing", artifact);
    }
    fs::remove_file(entry_dir.join("parking.json")).unwrap();

    let stored = JobStore::new(temp_dir.path().join("jobs"))
        .find_by_identifier("12PA")
        .unwrap();
    let key = key_for(&stored[0].job, "hems-scenery/test").unwrap();
    match cache.lookup(&key) {
        CacheLookup::Miss { missing } => assert_eq!(missing, vec!["parking.json"]),
        CacheLookup::Hit(_) => panic!("partial entry must not be a hit"),
    }

    let second = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    assert!(!only_result(&second).cache_hit);
    assert_eq!(builder.calls(), 2);
    assert!(entry_dir.join("parking.json").is_file(), "rebuild repairs the entry");
}

#[test]
fn test_changed_parameters_change_key() {
    let temp_dir = TempDir::new().unwrap();
    let builder = CountingBuilder::default();
    let pipeline = Pipeline::new(generator(temp_dir.path())).with_scene_builder(builder.clone());
    let sites = batch(&[site("12PA", "Mercy Hospital", 40.44, -79.99)]);

    let first = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    let options = BatchOptions {
        overrides: JobOverrides {
            hospital: Some(HospitalOverrides {
                floors: Some(Policy::Explicit(7)),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    };
    let second = pipeline.run_batch(&sites, &options).unwrap();

    assert_ne!(only_result(&first).cache_key, only_result(&second).cache_key);
    assert!(!only_result(&second).cache_hit);
    assert_eq!(only_result(&second).resolved.floors, 7);
    assert_eq!(builder.calls(), 2);
}

#[test]
fn test_generator_version_partitions_cache() {
    let temp_dir = TempDir::new().unwrap();
    let sites = batch(&[site("12PA", "Mercy Hospital", 40.44, -79.99)]);

    let v1 = Pipeline::new(generator(temp_dir.path()));
    v1.run_batch(&sites, &BatchOptions::default()).unwrap();

    let mut config = generator(temp_dir.path());
    config.generator_version = "hems-scenery/next".to_string();
    let v2 = Pipeline::new(config);
    let report = v2.run_batch(&sites, &BatchOptions::default()).unwrap();
    assert!(!only_result(&report).cache_hit);
}

#[test]
fn test_job_without_helipad_position_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(generator(temp_dir.path()));
    let sites = batch(&[site("12PA", "Mercy Hospital", 40.44, -79.99)]);
    let report = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    let result = only_result(&report);

    let text = fs::read_to_string(&result.job_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(value["helipad"]["position"].is_null());

    let job: Job = serde_json::from_str(&text).unwrap();
    assert_eq!(job.helipad.position, None);
    assert_eq!(job.site(), Site::new("12PA", "Mercy Hospital"));
    // co-located pad
    assert_eq!(result.resolved.helipad, job.location);
}

#[test]
fn test_unwritable_cache_still_delivers_package() {
    let temp_dir = TempDir::new().unwrap();
    let blocked = temp_dir.path().join("blocked-cache");
    fs::write(&blocked, "not a directory").unwrap();

    let mut config = generator(&temp_dir.path().join("out"));
    config.cache_dir = Some(blocked.clone());
    let builder = CountingBuilder::default();
    let pipeline = Pipeline::new(config).with_scene_builder(builder.clone());
    let sites = batch(&[site("12PA", "Mercy Hospital", 40.44, -79.99)]);

    let report = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    let result = only_result(&report);
    assert!(!result.cache_hit);
    assert!(result.zip_path.is_file());
    assert!(result.scene_path.is_file());

    let again = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    assert!(!only_result(&again).cache_hit);
    assert_eq!(builder.calls(), 2);
    assert!(blocked.is_file());
}
