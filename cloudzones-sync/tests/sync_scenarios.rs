use std::fs;
use std::path::Path;

use cloudzones_core::{
    config,
    store::{store_path_at, Store},
    types::{EntityKind, ProviderCode, RegionId, ZoneId},
};
use cloudzones_sync::{
    export, load_snapshot, ExportFormat, ExportOptions, Pipeline, SyncError, SyncOptions, SyncScope, WriteResult,
};
use tempfile::TempDir;

const AWS_RAW: &str = r#"{
    "us-east-1": {"zones": [
        {"ZoneName": "us-east-1a", "ZoneId": "use1-az6"},
        {"ZoneName": "us-east-1b", "ZoneId": "use1-az1"}
    ]},
    "us-gov-west-1": {"zones": ["us-gov-west-1a"]}
}"#;

const GCP_RAW: &str = r#"[
    {"name": "us-central1", "zones": [
        "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a",
        "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-b"
    ]},
    {"name": "europe-west4", "zones": ["europe-west4-a"]}
]"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn pinned(stamp: &str) -> SyncOptions {
    SyncOptions {
        synced_at: Some(stamp.to_string()),
        ..SyncOptions::default()
    }
}

fn write_config(root: &Path, aws: &str, gcp: &str) {
    fs::create_dir_all(root.join("raw")).unwrap();
    fs::write(root.join("raw/aws.json"), aws).unwrap();
    fs::write(root.join("raw/gcp.json"), gcp).unwrap();
    fs::write(
        config::config_path_at(root),
        "providers:\n  - code: aws\n    source: raw/aws.json\n  - code: gcp\n    source: raw/gcp.json\n",
    )
    .unwrap();
}

#[test]
fn aws_listing_produces_canonical_records() {
    init_logging();
    let mut store = Store::in_memory();
    let run = Pipeline::default()
        .sync_blobs(&mut store, [(ProviderCode::from("aws"), AWS_RAW)], &pinned("2024-05-01T00:00:00Z"))
        .expect("run");
    assert!(run.is_success());

    let region = store.region(&RegionId::from("aws-us-gov-west-1")).expect("gov region");
    assert_eq!(region.region_short_name, "usgw1");
    assert_eq!(region.region_short_name_with_provider, "aws-usgw1");

    let zone = store.zone(&ZoneId::from("aws-us-east-1a")).expect("zone");
    assert_eq!(zone.az_short_name_with_provider, "aws-use1a");
    assert_eq!(zone.az_id.as_deref(), Some("use1-az6"));
    assert_eq!(zone.region, RegionId::from("aws-us-east-1"));
    assert_eq!(zone.record_last_synced, "2024-05-01T00:00:00Z");
}

#[test]
fn malformed_provider_does_not_block_others() {
    init_logging();
    let mut store = Store::in_memory();
    let run = Pipeline::default()
        .sync_blobs(
            &mut store,
            [
                (ProviderCode::from("gcp"), r#"{"not": "a list"}"#),
                (ProviderCode::from("aws"), AWS_RAW),
            ],
            &pinned("t"),
        )
        .expect("run");

    assert!(!run.is_success());
    let failed: Vec<_> = run.failures().map(|o| o.provider.to_string()).collect();
    assert_eq!(failed, ["gcp"]);
    assert!(store.provider(&ProviderCode::from("gcp")).is_none());
    assert_eq!(store.list_zones(Some(&ProviderCode::from("aws")), None).len(), 3);
}

#[test]
fn prune_scenario_drops_vanished_region_and_zones() {
    let mut store = Store::in_memory();
    let pipeline = Pipeline::default();
    let gcp = ProviderCode::from("gcp");
    pipeline.sync_blobs(&mut store, [(gcp.clone(), GCP_RAW)], &pinned("t1")).unwrap();

    let shrunk = r#"[{"name": "us-central1", "zones": ["us-central1-a"]}]"#;
    let options = SyncOptions {
        prune: true,
        ..pinned("t2")
    };
    let run = pipeline.sync_blobs(&mut store, [(gcp.clone(), shrunk)], &options).unwrap();
    let summary = run.outcomes[0].result.as_ref().expect("gcp ok");
    assert_eq!(summary.pruned.regions, vec![RegionId::from("gcp-europe-west4")]);
    assert_eq!(summary.pruned.zones.len(), 2);

    let ids: Vec<_> = store.list_zones(Some(&gcp), None).iter().map(|z| z.id().0.clone()).collect();
    assert_eq!(ids, ["gcp-us-central1-a"]);
    store.check_integrity().unwrap();
}

#[test]
fn repeated_sync_exports_identical_bytes() {
    let mut store = Store::in_memory();
    let pipeline = Pipeline::default();
    let blobs = || [(ProviderCode::from("aws"), AWS_RAW), (ProviderCode::from("gcp"), GCP_RAW)];

    pipeline.sync_blobs(&mut store, blobs(), &pinned("2024-05-01T00:00:00Z")).unwrap();
    let first = export(&store, None, ExportOptions::default(), ExportFormat::Json).unwrap();

    let run = pipeline.sync_blobs(&mut store, blobs(), &pinned("2024-05-01T00:00:00Z")).unwrap();
    let second = export(&store, None, ExportOptions::default(), ExportFormat::Json).unwrap();

    assert_eq!(first, second);
    for outcome in &run.outcomes {
        let summary = outcome.result.as_ref().unwrap();
        assert_eq!(summary.regions.changed() + summary.zones.changed(), 0);
    }
}

#[test]
fn whole_store_export_seeds_an_empty_store() {
    let mut store = Store::in_memory();
    Pipeline::default()
        .sync_blobs(
            &mut store,
            [(ProviderCode::from("aws"), AWS_RAW), (ProviderCode::from("gcp"), GCP_RAW)],
            &pinned("2024-05-01T00:00:00Z"),
        )
        .unwrap();

    for options in [ExportOptions::default(), ExportOptions::natural()] {
        let doc = export(&store, None, options, ExportFormat::Json).unwrap();
        let mut seeded = Store::in_memory();
        load_snapshot(&mut seeded, &doc, ExportFormat::Json).unwrap();
        assert_eq!(export(&seeded, None, options, ExportFormat::Json).unwrap(), doc);
    }
}

#[test]
fn run_reads_configured_sources_and_persists() {
    let root = TempDir::new().unwrap();
    write_config(root.path(), AWS_RAW, GCP_RAW);
    let config = config::load_at(root.path()).unwrap();
    let mut store = Store::open_at(&config.store).unwrap();

    let options = SyncOptions {
        fixtures_dir: Some(config.fixtures_dir.clone()),
        ..pinned("2024-05-01T00:00:00Z")
    };
    let run = Pipeline::default()
        .run(&config, &mut store, &SyncScope::All, &options)
        .unwrap();
    assert!(run.is_success());
    let written = run.fixtures.as_ref().expect("fixtures");
    assert_eq!(written.len(), 4);
    assert!(written.iter().all(|w| matches!(w, WriteResult::Written { .. })));

    let reopened = Store::open_at(&store_path_at(root.path())).unwrap();
    assert_eq!(reopened.list_providers().len(), 2);
    assert_eq!(reopened.list_regions(Some(&ProviderCode::from("gcp"))).len(), 2);

    let again = Pipeline::default()
        .run(&config, &mut store, &SyncScope::All, &options)
        .unwrap();
    let rewritten = again.fixtures.as_ref().expect("fixtures");
    assert!(rewritten.iter().all(|w| matches!(w, WriteResult::Unchanged { .. })));
}

#[test]
fn scoped_run_touches_only_named_provider() {
    let root = TempDir::new().unwrap();
    write_config(root.path(), AWS_RAW, GCP_RAW);
    let config = config::load_at(root.path()).unwrap();
    let mut store = Store::in_memory();

    let run = Pipeline::default()
        .run(&config, &mut store, &SyncScope::Providers(vec![ProviderCode::from("gcp")]), &pinned("t"))
        .unwrap();
    assert_eq!(run.outcomes.len(), 1);
    assert!(store.provider(&ProviderCode::from("aws")).is_none());
}

#[test]
fn unknown_scoped_provider_fails_before_syncing() {
    let root = TempDir::new().unwrap();
    write_config(root.path(), AWS_RAW, GCP_RAW);
    let config = config::load_at(root.path()).unwrap();
    let mut store = Store::in_memory();

    let err = Pipeline::default()
        .run(&config, &mut store, &SyncScope::Providers(vec![ProviderCode::from("azure")]), &pinned("t"))
        .unwrap_err();
    assert!(matches!(err, SyncError::Ingest(_)), "got: {err}");
    assert!(store.is_empty());
}

#[test]
fn missing_raw_file_fails_only_its_provider() {
    let root = TempDir::new().unwrap();
    write_config(root.path(), AWS_RAW, GCP_RAW);
    fs::remove_file(root.path().join("raw/gcp.json")).unwrap();
    let config = config::load_at(root.path()).unwrap();
    let mut store = Store::in_memory();

    let run = Pipeline::default()
        .run(&config, &mut store, &SyncScope::All, &pinned("t"))
        .unwrap();
    let failed: Vec<_> = run.failures().map(|o| o.provider.to_string()).collect();
    assert_eq!(failed, ["gcp"]);
    assert!(store.provider(&ProviderCode::from("aws")).is_some());
}

#[test]
fn zone_fixture_references_are_natural() {
    let mut store = Store::in_memory();
    Pipeline::default()
        .sync_blobs(&mut store, [(ProviderCode::from("gcp"), GCP_RAW)], &pinned("t"))
        .unwrap();
    let zones = export(&store, Some(EntityKind::Zone), ExportOptions::natural(), ExportFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&zones).unwrap();
    assert_eq!(parsed[0]["region"], serde_json::json!(["gcp", "europe-west4"]));
    assert_eq!(parsed[0]["provider"], serde_json::json!(["gcp"]));
}
