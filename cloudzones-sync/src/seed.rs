//! Seed loader: a whole-store snapshot back into a store.
//!
//! Accepts either export format and either reference style. Records are
//! applied parents first inside one transaction, so a document with a bad
//! reference leaves the store untouched.

use std::path::Path;

use cloudzones_core::{
    store::{Store, Transaction},
    types::{AvailabilityZone, Provider, ProviderCode, Region, RegionId, ZoneId},
};

use crate::error::{io_err, SyncError};
use crate::export::{ExportFormat, Record, Reference, RegionRow, ZoneRow};
use crate::pipeline::UpsertCounts;

/// Upsert tallies of one seed load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub providers: UpsertCounts,
    pub regions: UpsertCounts,
    pub zones: UpsertCounts,
}

fn seed_err(reason: impl Into<String>) -> SyncError {
    SyncError::Seed { reason: reason.into() }
}

/// Parse a whole-store document.
pub fn parse_snapshot(doc: &str, format: ExportFormat) -> Result<Vec<Record>, SyncError> {
    Ok(match format {
        ExportFormat::Json => serde_json::from_str(doc)?,
        ExportFormat::Yaml => serde_yaml::from_str(doc)?,
    })
}

fn provider_of(reference: &Reference, owner: &str) -> Result<ProviderCode, SyncError> {
    match reference {
        Reference::Id(code) => Ok(ProviderCode::from(code.as_str())),
        Reference::Natural(key) => match key.as_slice() {
            [code] => Ok(ProviderCode::from(code.as_str())),
            _ => Err(seed_err(format!(
                "{owner}: provider natural key must have one element, got {key:?}"
            ))),
        },
    }
}

fn region_of(reference: &Reference, owner: &str) -> Result<RegionId, SyncError> {
    match reference {
        Reference::Id(id) => Ok(RegionId(id.clone())),
        Reference::Natural(key) => match key.as_slice() {
            [provider, region_name] => Ok(RegionId::compose(&ProviderCode::from(provider.as_str()), region_name)),
            _ => Err(seed_err(format!(
                "{owner}: region natural key must be [provider, region_name], got {key:?}"
            ))),
        },
    }
}

fn region_from_row(row: RegionRow) -> Result<Region, SyncError> {
    let provider = provider_of(&row.provider, &row.region_name_with_provider)?;
    Ok(Region {
        region_name_with_provider: RegionId(row.region_name_with_provider),
        provider,
        record_last_synced: row.record_last_synced,
        region_name: row.region_name,
        region_short_name: row.region_short_name,
        region_short_name_with_provider: row.region_short_name_with_provider,
    })
}

fn zone_from_row(tx: &Transaction, row: ZoneRow) -> Result<AvailabilityZone, SyncError> {
    let owner = row.az_name_with_provider.as_str();
    let provider = provider_of(&row.provider, owner)?;
    let region = region_of(&row.region, owner)?;
    if tx.region(&region).is_none() {
        return Err(seed_err(format!("{owner}: region '{region}' is not in the document or store")));
    }
    Ok(AvailabilityZone {
        az_name_with_provider: ZoneId(row.az_name_with_provider),
        provider,
        region,
        record_last_synced: row.record_last_synced,
        az_name: row.az_name,
        az_short_name: row.az_short_name,
        az_id: row.az_id,
        az_short_name_with_provider: row.az_short_name_with_provider,
    })
}

/// Load parsed records into `store` as one transaction.
pub fn load_records(store: &mut Store, mut records: Vec<Record>) -> Result<SeedReport, SyncError> {
    records.sort_by_key(Record::kind);
    store.transaction(|tx| -> Result<SeedReport, SyncError> {
        let mut report = SeedReport::default();
        for record in records {
            match record {
                Record::Provider(row) => {
                    report.providers.record(tx.upsert_provider(Provider::new(row.provider)));
                }
                Record::Region(row) => {
                    let region = region_from_row(row)?;
                    report.regions.record(tx.upsert_region(region)?);
                }
                Record::Zone(row) => {
                    let zone = zone_from_row(tx, row)?;
                    report.zones.record(tx.upsert_zone(zone)?);
                }
            }
        }
        Ok(report)
    })
}

/// `load_snapshot(doc)`: parse and load a whole-store document.
pub fn load_snapshot(store: &mut Store, doc: &str, format: ExportFormat) -> Result<SeedReport, SyncError> {
    let records = parse_snapshot(doc, format)?;
    let report = load_records(store, records)?;
    tracing::info!(
        "seeded {} provider(s), {} region(s), {} zone(s)",
        report.providers.inserted,
        report.regions.changed(),
        report.zones.changed()
    );
    Ok(report)
}

/// Read `path` and load it; the format follows the file extension.
pub fn load_snapshot_file(store: &mut Store, path: &Path) -> Result<SeedReport, SyncError> {
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => ExportFormat::Yaml,
        _ => ExportFormat::Json,
    };
    let doc = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    load_snapshot(store, &doc, format)
}
