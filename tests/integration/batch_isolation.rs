//! Batch-level invariants and per-site failure isolation

use hems_scenery::error::PipelineError;
use hems_scenery::job::JOB_FILE_NAME;
use hems_scenery::pipeline::{BatchOptions, FailureKind, Pipeline, SiteOutcome};
use hems_scenery::site::{Site, SiteBatch, SiteRequest};
use std::fs;
use std::io::Read;
use tempfile::TempDir;

use crate::integration::test_utils::{batch, generator, site, CountingBuilder};

#[test]
fn test_corrupt_job_fails_only_its_site() {
    let temp_dir = TempDir::new().unwrap();
    let bad_dir = temp_dir.path().join("jobs/99XY_County_General");
    fs::create_dir_all(&bad_dir).unwrap();
    fs::write(bad_dir.join(JOB_FILE_NAME), "{ \"id\": \"99XY\", ").unwrap();

    let pipeline = Pipeline::new(generator(temp_dir.path()));
    let sites = batch(&[
        site("12PA", "Mercy Hospital", 40.44, -79.99),
        site("99XY", "County General", 41.0, -80.5),
        site("7AB", "St. Luke's", 39.9, -75.1),
    ]);

    let report = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    let ids: Vec<&str> = report.outcomes.iter().map(SiteOutcome::identifier).collect();
    assert_eq!(ids, vec!["12PA", "99XY", "7AB"], "input order is preserved");
    assert_eq!(report.packaged_count(), 2);

    let failure = report.failures().next().unwrap();
    assert_eq!(failure.identifier, "99XY");
    assert_eq!(failure.kind, FailureKind::Job);

    // the corrupt file is left for the user to repair
    assert_eq!(
        fs::read_to_string(bad_dir.join(JOB_FILE_NAME)).unwrap(),
        "{ \"id\": \"99XY\", "
    );
    assert!(!temp_dir.path().join("HOSP_99XY_County_General.zip").exists());
    assert!(temp_dir.path().join("HOSP_7AB_St_Luke_s.zip").is_file());
}

#[test]
fn test_collision_aborts_before_any_site_runs() {
    let temp_dir = TempDir::new().unwrap();
    let builder = CountingBuilder::default();
    let pipeline = Pipeline::new(generator(temp_dir.path())).with_scene_builder(builder.clone());
    let sites = batch(&[
        site("12PA", "Mercy Hospital", 40.44, -79.99),
        site("A_B", "C", 40.0, -80.0),
        site("A", "B_C", 40.0, -80.0),
    ]);

    let err = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap_err();
    match err {
        PipelineError::PathCollision {
            path,
            first,
            second,
        } => {
            assert!(path.ends_with("HOSP_A_B_C.zip"));
            assert_eq!(first, "A_B");
            assert_eq!(second, "A");
        }
        other => panic!("expected collision, got {:?}", other),
    }
    assert_eq!(builder.calls(), 0);
    assert!(!temp_dir.path().join("jobs").exists());
}

#[test]
fn test_identical_site_pairs_collide() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out");
    let builder = CountingBuilder::default();
    let pipeline = Pipeline::new(generator(&output)).with_scene_builder(builder.clone());
    let sites = SiteBatch {
        sites: vec![Site::new("12pa", "Mercy"), Site::new("12PA", "Mercy!")],
        ..Default::default()
    };

    match pipeline.run_batch(&sites, &BatchOptions::default()) {
        Err(PipelineError::PathCollision {
            path,
            first,
            second,
        }) => {
            assert!(path.ends_with("HOSP_12PA_Mercy.zip"));
            assert_eq!(first, "12PA");
            assert_eq!(second, "12PA");
        }
        other => panic!("expected collision, got {:?}", other),
    }
    assert_eq!(builder.calls(), 0);
    assert!(!output.exists(), "nothing is written before the check");
}

#[test]
fn test_path_like_identifier_stays_inside_roots() {
    let temp_dir = TempDir::new().unwrap();
    let outside = temp_dir.path().join("KEEP_data");
    fs::create_dir_all(&outside).unwrap();
    fs::write(outside.join("precious.txt"), "keep me").unwrap();

    let output = temp_dir.path().join("out");
    let builder = CountingBuilder::default();
    let pipeline = Pipeline::new(generator(&output)).with_scene_builder(builder.clone());
    let sites = batch(&[
        site("../../../keep", "data", 40.0, -80.0),
        site("12PA", "Mercy Hospital", 40.44, -79.99),
    ]);

    let report = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    let ids: Vec<&str> = report.outcomes.iter().map(SiteOutcome::identifier).collect();
    assert_eq!(ids, vec!["../../../KEEP", "12PA"]);
    assert_eq!(report.packaged_count(), 1);
    assert_eq!(builder.calls(), 1);

    let failure = report.failures().next().unwrap();
    assert_eq!(failure.kind, FailureKind::Input);

    assert_eq!(
        fs::read_to_string(outside.join("precious.txt")).unwrap(),
        "keep me"
    );
    assert!(!outside.join("hospital_job.json").exists());
    let mut siblings: Vec<String> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    siblings.sort();
    assert_eq!(siblings, vec!["KEEP_data", "out"]);
}

#[test]
fn test_empty_batch_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(generator(temp_dir.path()));
    let sites = batch(&[SiteRequest::id_only("   ")]);
    assert!(matches!(
        pipeline.run_batch(&sites, &BatchOptions::default()),
        Err(PipelineError::NoSites)
    ));
}

#[test]
fn test_archive_holds_full_package_tree() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(generator(temp_dir.path()));
    let sites = batch(&[site("12pa", "Mercy Hospital", 40.44, -79.99)]);
    let report = pipeline.run_batch(&sites, &BatchOptions::default()).unwrap();
    let result = report.packaged().next().unwrap();

    let file = fs::File::open(&result.zip_path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    for expected in [
        "HOSP_12PA_Mercy_Hospital/scene.json",
        "HOSP_12PA_Mercy_Hospital/objects/hospital_0.obj",
        "HOSP_12PA_Mercy_Hospital/objects/helipad_marker.obj",
        "HOSP_12PA_Mercy_Hospital/polygons/helipad_markings.pol",
        "HOSP_12PA_Mercy_Hospital/Earth nav data/+40-080/+40-080.dsf",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }

    let mut scene = String::new();
    archive
        .by_name("HOSP_12PA_Mercy_Hospital/scene.json")
        .unwrap()
        .read_to_string(&mut scene)
        .unwrap();
    assert_eq!(scene, fs::read_to_string(&result.scene_path).unwrap());
}

#[test]
fn test_jobs_survive_and_are_reused_between_batches() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(generator(temp_dir.path()));

    let first = batch(&[site("12PA", "Mercy Hospital", 40.44, -79.99)]);
    pipeline.run_batch(&first, &BatchOptions::default()).unwrap();

    // later coordinates do not move an existing job
    let second = batch(&[site("12PA", "Mercy Hospital", 10.0, 10.0)]);
    let report = pipeline.run_batch(&second, &BatchOptions::default()).unwrap();
    let result = report.packaged().next().unwrap();
    assert!(result.cache_hit);
    assert_eq!(result.resolved.helipad.lat, 40.44);
}
