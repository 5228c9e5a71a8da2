//! Store integration tests: persistence, ordering, integrity across sequences
//! of upserts, prunes and cascades.

use assert_fs::prelude::*;
use cloudzones_core::{
    config,
    store::{self, LiveSet, Store},
    types::{with_provider, AvailabilityZone, Provider, ProviderCode, Region, RegionId, ZoneId},
    StoreError,
};
use predicates::prelude::predicate;
use rstest::rstest;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn region(provider: &str, name: &str) -> Region {
    let code = ProviderCode::from(provider);
    Region {
        region_name_with_provider: RegionId::compose(&code, name),
        provider: code.clone(),
        record_last_synced: "2024-05-01T00:00:00Z".to_string(),
        region_name: name.to_string(),
        region_short_name: name.replace('-', ""),
        region_short_name_with_provider: with_provider(&code, &name.replace('-', "")),
    }
}

fn zone(provider: &str, region_name: &str, az: &str, az_id: Option<&str>) -> AvailabilityZone {
    let code = ProviderCode::from(provider);
    AvailabilityZone {
        az_name_with_provider: ZoneId::compose(&code, az),
        provider: code.clone(),
        region: RegionId::compose(&code, region_name),
        record_last_synced: "2024-05-01T00:00:00Z".to_string(),
        az_name: az.to_string(),
        az_short_name: az.replace('-', ""),
        az_id: az_id.map(str::to_string),
        az_short_name_with_provider: with_provider(&code, &az.replace('-', "")),
    }
}

fn populate(store: &mut Store) {
    store
        .transaction(|tx| -> Result<(), StoreError> {
            for provider in ["aws", "gcp"] {
                tx.upsert_provider(Provider::new(provider));
            }
            tx.upsert_region(region("aws", "us-east-1"))?;
            tx.upsert_region(region("aws", "eu-west-1"))?;
            tx.upsert_region(region("gcp", "us-central1"))?;
            tx.upsert_zone(zone("aws", "us-east-1", "us-east-1a", Some("use1-az1")))?;
            tx.upsert_zone(zone("aws", "us-east-1", "us-east-1b", Some("use1-az2")))?;
            tx.upsert_zone(zone("aws", "eu-west-1", "eu-west-1a", None))?;
            tx.upsert_zone(zone("gcp", "us-central1", "us-central1-a", None))?;
            Ok(())
        })
        .expect("populate");
}

fn assert_referential_integrity(store: &Store) {
    store.check_integrity().expect("integrity");
    for z in store.list_zones(None, None) {
        let region = store.region(&z.region).expect("zone region exists");
        assert_eq!(region.provider, z.provider, "zone {z} crosses providers");
    }
    for r in store.list_regions(None) {
        assert!(store.provider(&r.provider).is_some(), "region {r} has no provider");
    }
}

// ---------------------------------------------------------------------------
// 1. Persistence
// ---------------------------------------------------------------------------

#[test]
fn store_document_is_written_atomically_and_sorted() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let path = store::store_path_at(root.path());
    let mut store = Store::open_at(&path).expect("open");
    populate(&mut store);

    root.child("store.json").assert(predicate::path::exists());
    root.child("store.json.tmp").assert(predicate::path::missing());
    root.child("store.json").assert(predicate::str::contains("\"aws-eu-west-1\""));

    let text = std::fs::read_to_string(&path).unwrap();
    let eu = text.find("\"aws-eu-west-1\"").unwrap();
    let us = text.find("\"aws-us-east-1\"").unwrap();
    assert!(eu < us, "regions must be persisted in identifier order");
}

#[test]
fn rolled_back_batch_leaves_file_untouched() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let path = store::store_path_at(root.path());
    let mut store = Store::open_at(&path).expect("open");
    populate(&mut store);
    let before = std::fs::read(&path).unwrap();

    let err = store
        .transaction(|tx| -> Result<(), StoreError> {
            tx.upsert_region(region("aws", "ap-south-1"))?;
            tx.upsert_zone(zone("aws", "ap-south-2", "ap-south-2a", None))?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::Integrity { .. }));

    assert_eq!(std::fs::read(&path).unwrap(), before);
    let reopened = Store::open_at(&path).unwrap();
    assert!(reopened.region(&RegionId::from("aws-ap-south-1")).is_none());
}

#[test]
fn store_path_sits_under_config_root() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let root = config::default_root_at(home.path());
    let cfg = config::init_at(&root).expect("init");
    assert_eq!(cfg.store, store::store_path_at(&root));
    home.child(".cloudzones/config.yaml").assert(predicate::path::exists());
}

// ---------------------------------------------------------------------------
// 2. Ordering regardless of insertion order
// ---------------------------------------------------------------------------

#[rstest]
#[case(&["us-east-1c", "us-east-1a", "us-east-1b"])]
#[case(&["us-east-1b", "us-east-1c", "us-east-1a"])]
#[case(&["us-east-1a", "us-east-1b", "us-east-1c"])]
fn zones_listed_in_identifier_order(#[case] order: &[&str]) {
    let mut store = Store::in_memory();
    store.upsert_provider(Provider::new("aws")).unwrap();
    store.upsert_region(region("aws", "us-east-1")).unwrap();
    for az in order {
        store.upsert_zone(zone("aws", "us-east-1", az, None)).unwrap();
    }
    let ids: Vec<String> = store.list_zones(None, None).iter().map(|z| z.id().0.clone()).collect();
    assert_eq!(ids, ["aws-us-east-1a", "aws-us-east-1b", "aws-us-east-1c"]);
}

// ---------------------------------------------------------------------------
// 3. Integrity across operation sequences
// ---------------------------------------------------------------------------

#[test]
fn integrity_holds_after_mixed_operations() {
    let mut store = Store::in_memory();
    populate(&mut store);
    assert_referential_integrity(&store);

    let live = LiveSet {
        regions: [RegionId::from("aws-us-east-1")].into_iter().collect(),
        zones: [ZoneId::from("aws-us-east-1a")].into_iter().collect(),
    };
    let pruned = store.prune_provider(&ProviderCode::from("aws"), &live).unwrap();
    assert_eq!(pruned.regions, vec![RegionId::from("aws-eu-west-1")]);
    assert_referential_integrity(&store);

    store.upsert_zone(zone("aws", "us-east-1", "us-east-1b", Some("use1-az2"))).unwrap();
    assert_referential_integrity(&store);

    store.delete_provider(&ProviderCode::from("gcp")).unwrap();
    assert_referential_integrity(&store);
    assert!(store.list_regions(Some(&ProviderCode::from("gcp"))).is_empty());
    assert_eq!(store.list_zones(Some(&ProviderCode::from("aws")), None).len(), 2);
}

#[test]
fn cascade_inside_failed_batch_is_not_applied() {
    let mut store = Store::in_memory();
    populate(&mut store);

    let result = store.transaction(|tx| -> Result<(), StoreError> {
        let removed = tx.delete_provider(&ProviderCode::from("aws"))?;
        assert_eq!(removed.zones.len(), 3);
        Err(StoreError::CascadeFailure {
            provider: ProviderCode::from("aws"),
            detail: "caller aborted".to_string(),
        })
    });
    assert!(result.is_err());
    assert_eq!(store.list_regions(Some(&ProviderCode::from("aws"))).len(), 2);
    assert_eq!(store.list_zones(Some(&ProviderCode::from("aws")), None).len(), 3);
    assert_referential_integrity(&store);
}

#[test]
fn moving_region_with_zones_to_other_provider_is_rejected() {
    let mut store = Store::in_memory();
    populate(&mut store);
    let mut moved = region("aws", "us-east-1");
    moved.provider = ProviderCode::from("gcp");
    let err = store.upsert_region(moved).unwrap_err();
    assert!(err.to_string().contains("while zones reference it"), "got: {err}");
}
