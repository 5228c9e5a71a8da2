//! Snapshot exporter.
//!
//! A snapshot is an ordered sequence of field-mappings, one per record,
//! sorted by identifier. Field order is fixed by the row structs below, so
//! identical store contents always render to identical bytes.
//!
//! A whole-store snapshot lists providers, then regions, then zones and tags
//! every mapping with a leading `model` key; a snapshot scoped to one entity
//! type carries no tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use cloudzones_core::{
    store::Store,
    types::{AvailabilityZone, EntityKind, Provider, ProviderCode, Region},
};

use crate::error::SyncError;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            other => Err(format!("unknown format '{other}'; expected: json, yaml")),
        }
    }
}

/// Per-field natural-key substitution.
///
/// With `natural_provider`, `provider` references render as `["aws"]`; with
/// `natural_region`, a zone's `region` renders as `["aws", "us-east-1"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    pub natural_provider: bool,
    pub natural_region: bool,
}

impl ExportOptions {
    pub fn natural() -> Self {
        Self {
            natural_provider: true,
            natural_region: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A reference to another record: its identifier or its natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Id(String),
    Natural(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRow {
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRow {
    pub region_name_with_provider: String,
    pub provider: Reference,
    pub record_last_synced: String,
    pub region_name: String,
    pub region_short_name: String,
    pub region_short_name_with_provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRow {
    pub az_name_with_provider: String,
    pub provider: Reference,
    pub region: Reference,
    pub record_last_synced: String,
    pub az_name: String,
    pub az_short_name: String,
    #[serde(default)]
    pub az_id: Option<String>,
    pub az_short_name_with_provider: String,
}

/// One mapping of a whole-store snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum Record {
    Provider(ProviderRow),
    Region(RegionRow),
    Zone(ZoneRow),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Provider(_) => EntityKind::Provider,
            Record::Region(_) => EntityKind::Region,
            Record::Zone(_) => EntityKind::Zone,
        }
    }
}

/// An ordered document, whole-store or scoped to one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Snapshot {
    All(Vec<Record>),
    Providers(Vec<ProviderRow>),
    Regions(Vec<RegionRow>),
    Zones(Vec<ZoneRow>),
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

fn provider_row(provider: &Provider) -> ProviderRow {
    ProviderRow {
        provider: provider.provider.to_string(),
    }
}

fn provider_ref(code: &ProviderCode, options: ExportOptions) -> Reference {
    if options.natural_provider {
        Reference::Natural(vec![code.to_string()])
    } else {
        Reference::Id(code.to_string())
    }
}

fn region_row(region: &Region, options: ExportOptions) -> RegionRow {
    RegionRow {
        region_name_with_provider: region.region_name_with_provider.0.clone(),
        provider: provider_ref(&region.provider, options),
        record_last_synced: region.record_last_synced.clone(),
        region_name: region.region_name.clone(),
        region_short_name: region.region_short_name.clone(),
        region_short_name_with_provider: region.region_short_name_with_provider.clone(),
    }
}

fn zone_row(store: &Store, zone: &AvailabilityZone, options: ExportOptions) -> ZoneRow {
    let region = match store.region(&zone.region) {
        Some(parent) if options.natural_region => {
            Reference::Natural(vec![parent.provider.to_string(), parent.region_name.clone()])
        }
        _ => Reference::Id(zone.region.0.clone()),
    };
    ZoneRow {
        az_name_with_provider: zone.az_name_with_provider.0.clone(),
        provider: provider_ref(&zone.provider, options),
        region,
        record_last_synced: zone.record_last_synced.clone(),
        az_name: zone.az_name.clone(),
        az_short_name: zone.az_short_name.clone(),
        az_id: zone.az_id.clone(),
        az_short_name_with_provider: zone.az_short_name_with_provider.clone(),
    }
}

/// Build the snapshot of `entity` (or the whole store when `None`).
pub fn snapshot(store: &Store, entity: Option<EntityKind>, options: ExportOptions) -> Snapshot {
    let providers = || store.list_providers().into_iter().map(provider_row);
    let regions = || store.list_regions(None).into_iter().map(move |r| region_row(r, options));
    let zones = || store.list_zones(None, None).into_iter().map(move |z| zone_row(store, z, options));

    match entity {
        None => Snapshot::All(
            providers()
                .map(Record::Provider)
                .chain(regions().map(Record::Region))
                .chain(zones().map(Record::Zone))
                .collect(),
        ),
        Some(EntityKind::Provider) => Snapshot::Providers(providers().collect()),
        Some(EntityKind::Region) => Snapshot::Regions(regions().collect()),
        Some(EntityKind::Zone) => Snapshot::Zones(zones().collect()),
    }
}

/// Serialize a snapshot. JSON uses a 4-space indent; both formats end with a
/// newline.
pub fn render(snapshot: &Snapshot, format: ExportFormat) -> Result<String, SyncError> {
    match format {
        ExportFormat::Json => {
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            snapshot.serialize(&mut ser)?;
            let mut out = String::from_utf8_lossy(&buf).into_owned();
            out.push('\n');
            Ok(out)
        }
        ExportFormat::Yaml => Ok(serde_yaml::to_string(snapshot)?),
    }
}

/// `export(entity_type?)`: snapshot + render.
pub fn export(
    store: &Store,
    entity: Option<EntityKind>,
    options: ExportOptions,
    format: ExportFormat,
) -> Result<String, SyncError> {
    render(&snapshot(store, entity, options), format)
}
