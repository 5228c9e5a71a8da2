use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const AWS_RAW: &str = r#"{"us-east-1": {"zones": ["us-east-1a", "us-east-1b"]}}"#;
const GCP_RAW: &str = r#"[{"name": "us-central1", "zones": ["us-central1-a"]}]"#;

fn cloudzones(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cloudzones"));
    cmd.arg("--root").arg(root).env("RUST_LOG", "warn");
    cmd
}

fn init_root(aws: &str, gcp: &str) -> TempDir {
    let root = TempDir::new().expect("root");
    cloudzones(root.path()).arg("init").assert().success().stdout(contains("config.yaml"));
    let data = root.path().join("region_data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("aws_regions.json"), aws).unwrap();
    fs::write(data.join("unparsed_gcloud_output.json"), gcp).unwrap();
    root
}

#[test]
fn commands_without_init_point_at_init() {
    let root = TempDir::new().unwrap();
    cloudzones(root.path())
        .args(["list", "providers"])
        .assert()
        .failure()
        .stderr(contains("cloudzones init"));
}

#[test]
fn sync_then_list_and_export() {
    let root = init_root(AWS_RAW, GCP_RAW);
    cloudzones(root.path())
        .args(["sync", "--synced-at", "2024-05-01T00:00:00Z"])
        .assert()
        .success()
        .stdout(contains("aws").and(contains("gcp")));

    cloudzones(root.path())
        .args(["list", "zones", "--provider", "aws"])
        .assert()
        .success()
        .stdout(contains("aws-us-east-1b").and(contains("gcp-").not()));

    let out = cloudzones(root.path())
        .args(["export", "--entity", "region"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json[0]["region_name_with_provider"], "aws-us-east-1");
    assert_eq!(json[1]["region_short_name_with_provider"], "gcp-usc1");
}

#[test]
fn failed_provider_gives_nonzero_exit_but_others_sync() {
    let root = init_root(AWS_RAW, r#"[{"name": "us-central1"}]"#);
    cloudzones(root.path())
        .arg("sync")
        .assert()
        .failure()
        .stderr(contains("gcp").and(contains("1 provider(s) failed")));

    cloudzones(root.path())
        .args(["list", "regions", "--json"])
        .assert()
        .success()
        .stdout(contains("aws-us-east-1").and(contains("gcp-").not()));
}

#[test]
fn fixtures_then_diff_is_clean() {
    let root = init_root(AWS_RAW, GCP_RAW);
    cloudzones(root.path()).args(["sync", "--fixtures"]).assert().success();
    assert!(root.path().join("fixtures/cloud_zones-zone.json").exists());

    cloudzones(root.path())
        .arg("diff")
        .assert()
        .success()
        .stdout(contains("up to date"));
    cloudzones(root.path())
        .arg("fixtures")
        .assert()
        .success()
        .stdout(contains("0 written, 4 unchanged"));
}

#[test]
fn delete_provider_then_seed_restores_it() {
    let root = init_root(AWS_RAW, GCP_RAW);
    cloudzones(root.path()).arg("sync").assert().success();
    let snapshot = root.path().join("snapshot.yaml");
    cloudzones(root.path())
        .args(["export", "--natural-provider", "--natural-region", "--format", "yaml", "--output"])
        .arg(&snapshot)
        .assert()
        .success();

    cloudzones(root.path())
        .args(["delete-provider", "AWS"])
        .assert()
        .success()
        .stdout(contains("1 region(s), 2 zone(s)"));
    cloudzones(root.path())
        .args(["list", "zones", "--json"])
        .assert()
        .success()
        .stdout(contains("aws-").not());

    cloudzones(root.path())
        .arg("seed")
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(contains("zones 2 new"));
    cloudzones(root.path())
        .arg("check")
        .assert()
        .success()
        .stdout(contains("2 provider(s), 2 region(s), 3 zone(s)"));
}

#[test]
fn invalid_synced_at_is_rejected() {
    let root = init_root(AWS_RAW, GCP_RAW);
    cloudzones(root.path())
        .args(["sync", "--synced-at", "yesterday"])
        .assert()
        .failure()
        .stderr(contains("RFC 3339"));
    assert!(!root.path().join("store.json").exists());
}
