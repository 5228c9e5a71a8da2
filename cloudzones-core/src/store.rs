//! Reconciliation store: provider → region → zone.
//!
//! # Storage layout
//!
//! ```text
//! <root>/
//!   store.json      (sorted arrays of providers, regions, zones)
//! ```
//!
//! # Write model
//!
//! Every write goes through [`Store::transaction`]. The closure mutates a
//! staged copy of the data; the copy is integrity-checked, persisted with the
//! `.tmp` + rename protocol and swapped in only when the closure returns `Ok`.
//! Any error drops the staged copy, so memory and disk keep their pre-batch
//! state. The single-record methods on [`Store`] are one-write transactions.
//!
//! Referential integrity is checked on each write rather than left to a
//! storage engine: a region needs its provider, a zone needs its region, and
//! a zone's region must belong to the zone's provider.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError};
use crate::types::{AvailabilityZone, EntityKind, Provider, ProviderCode, Region, RegionId, ZoneId};

const STORE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Public result types
// ---------------------------------------------------------------------------

/// What an upsert did to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// Mutable fields replaced in place.
    Updated,
    /// Content identical apart from `record_last_synced`, which is still
    /// overwritten with the incoming stamp.
    Unchanged,
}

/// Identifiers freshly produced for one provider. Anything the provider owns
/// outside this set is stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSet {
    pub regions: BTreeSet<RegionId>,
    pub zones: BTreeSet<ZoneId>,
}

/// Records removed by a prune or a cascade delete, in identifier order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub regions: Vec<RegionId>,
    pub zones: Vec<ZoneId>,
}

impl PruneReport {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.zones.is_empty()
    }
}

// ---------------------------------------------------------------------------
// In-memory data
// ---------------------------------------------------------------------------

/// One removal performed by a cascade, reported to the step hook.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CascadeStep {
    Zone(ZoneId),
    Region(RegionId),
    Provider(ProviderCode),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct StoreData {
    providers: BTreeMap<ProviderCode, Provider>,
    regions: BTreeMap<RegionId, Region>,
    zones: BTreeMap<ZoneId, AvailabilityZone>,
}

impl StoreData {
    fn upsert_provider(&mut self, provider: Provider) -> UpsertOutcome {
        match self.providers.get(&provider.provider) {
            Some(_) => UpsertOutcome::Unchanged,
            None => {
                tracing::debug!("insert provider {}", provider.provider);
                self.providers.insert(provider.provider.clone(), provider);
                UpsertOutcome::Inserted
            }
        }
    }

    fn upsert_region(&mut self, region: Region) -> Result<UpsertOutcome, StoreError> {
        let id = region.region_name_with_provider.clone();
        check_region_id(&region)?;
        if !self.providers.contains_key(&region.provider) {
            return Err(StoreError::integrity(
                EntityKind::Region,
                id.0,
                format!("provider '{}' does not exist", region.provider),
            ));
        }

        let Some(existing) = self.regions.get(&id) else {
            tracing::debug!("insert region {id}");
            self.regions.insert(id, region);
            return Ok(UpsertOutcome::Inserted);
        };

        if existing.same_content(&region) {
            self.regions.insert(id, region);
            return Ok(UpsertOutcome::Unchanged);
        }
        if existing.provider != region.provider && self.zones.values().any(|z| z.region == id) {
            return Err(StoreError::integrity(
                EntityKind::Region,
                id.0,
                format!(
                    "cannot move from provider '{}' to '{}' while zones reference it",
                    existing.provider, region.provider
                ),
            ));
        }
        tracing::debug!("update region {id}");
        self.regions.insert(id, region);
        Ok(UpsertOutcome::Updated)
    }

    fn upsert_zone(&mut self, zone: AvailabilityZone) -> Result<UpsertOutcome, StoreError> {
        let id = zone.az_name_with_provider.clone();
        check_zone_id(&zone)?;
        let Some(region) = self.regions.get(&zone.region) else {
            return Err(StoreError::integrity(
                EntityKind::Zone,
                id.0,
                format!("region '{}' does not exist", zone.region),
            ));
        };
        if region.provider != zone.provider {
            return Err(StoreError::integrity(
                EntityKind::Zone,
                id.0,
                format!(
                    "zone provider '{}' differs from region '{}' provider '{}'",
                    zone.provider, region.region_name_with_provider, region.provider
                ),
            ));
        }

        let outcome = match self.zones.get(&id) {
            None => UpsertOutcome::Inserted,
            Some(existing) if existing.same_content(&zone) => UpsertOutcome::Unchanged,
            Some(_) => UpsertOutcome::Updated,
        };
        match outcome {
            UpsertOutcome::Inserted => tracing::debug!("insert zone {id}"),
            UpsertOutcome::Updated => tracing::debug!("update zone {id}"),
            UpsertOutcome::Unchanged => {}
        }
        self.zones.insert(id, zone);
        Ok(outcome)
    }

    fn delete_provider(&mut self, provider: &ProviderCode) -> Result<PruneReport, StoreError> {
        self.cascade_delete(provider, |_| Ok(()))
    }

    /// Removes zones, then regions, then the provider, calling `step` after
    /// each removal. Callers run this on staged data only; an error from
    /// `step` or from the completeness check abandons the whole cascade.
    fn cascade_delete<F>(&mut self, provider: &ProviderCode, mut step: F) -> Result<PruneReport, StoreError>
    where
        F: FnMut(&CascadeStep) -> Result<(), StoreError>,
    {
        if !self.providers.contains_key(provider) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Provider,
                id: provider.to_string(),
            });
        }

        let region_ids: BTreeSet<RegionId> = self
            .regions
            .values()
            .filter(|r| &r.provider == provider)
            .map(|r| r.region_name_with_provider.clone())
            .collect();
        let zone_ids: Vec<ZoneId> = self
            .zones
            .values()
            .filter(|z| &z.provider == provider || region_ids.contains(&z.region))
            .map(|z| z.az_name_with_provider.clone())
            .collect();

        for id in &zone_ids {
            self.zones.remove(id);
            step(&CascadeStep::Zone(id.clone()))?;
        }
        for id in &region_ids {
            self.regions.remove(id);
            step(&CascadeStep::Region(id.clone()))?;
        }
        self.providers.remove(provider);
        step(&CascadeStep::Provider(provider.clone()))?;

        let leftover_regions = self.regions.values().filter(|r| &r.provider == provider).count();
        let leftover_zones = self
            .zones
            .values()
            .filter(|z| &z.provider == provider || region_ids.contains(&z.region))
            .count();
        if leftover_regions > 0 || leftover_zones > 0 {
            return Err(StoreError::CascadeFailure {
                provider: provider.clone(),
                detail: format!("{leftover_regions} region(s) and {leftover_zones} zone(s) remain"),
            });
        }

        Ok(PruneReport {
            regions: region_ids.into_iter().collect(),
            zones: zone_ids,
        })
    }

    fn prune_provider(&mut self, provider: &ProviderCode, live: &LiveSet) -> Result<PruneReport, StoreError> {
        if !self.providers.contains_key(provider) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Provider,
                id: provider.to_string(),
            });
        }

        let stale_regions: BTreeSet<RegionId> = self
            .regions
            .values()
            .filter(|r| &r.provider == provider && !live.regions.contains(&r.region_name_with_provider))
            .map(|r| r.region_name_with_provider.clone())
            .collect();
        let stale_zones: Vec<ZoneId> = self
            .zones
            .values()
            .filter(|z| {
                &z.provider == provider
                    && (!live.zones.contains(&z.az_name_with_provider) || stale_regions.contains(&z.region))
            })
            .map(|z| z.az_name_with_provider.clone())
            .collect();

        for id in &stale_zones {
            tracing::debug!("prune zone {id}");
            self.zones.remove(id);
        }
        for id in &stale_regions {
            tracing::debug!("prune region {id}");
            self.regions.remove(id);
        }

        Ok(PruneReport {
            regions: stale_regions.into_iter().collect(),
            zones: stale_zones,
        })
    }

    fn check_integrity(&self) -> Result<(), StoreError> {
        for (key, provider) in &self.providers {
            if key != &provider.provider {
                return Err(StoreError::integrity(EntityKind::Provider, key.to_string(), "key does not match identifier"));
            }
        }
        for (key, region) in &self.regions {
            if key != &region.region_name_with_provider {
                return Err(StoreError::integrity(EntityKind::Region, key.0.clone(), "key does not match identifier"));
            }
            check_region_id(region)?;
            if !self.providers.contains_key(&region.provider) {
                return Err(StoreError::integrity(
                    EntityKind::Region,
                    key.0.clone(),
                    format!("provider '{}' does not exist", region.provider),
                ));
            }
        }
        for (key, zone) in &self.zones {
            if key != &zone.az_name_with_provider {
                return Err(StoreError::integrity(EntityKind::Zone, key.0.clone(), "key does not match identifier"));
            }
            check_zone_id(zone)?;
            match self.regions.get(&zone.region) {
                None => {
                    return Err(StoreError::integrity(
                        EntityKind::Zone,
                        key.0.clone(),
                        format!("region '{}' does not exist", zone.region),
                    ))
                }
                Some(region) if region.provider != zone.provider => {
                    return Err(StoreError::integrity(
                        EntityKind::Zone,
                        key.0.clone(),
                        format!("region '{}' belongs to provider '{}'", zone.region, region.provider),
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn list_regions(&self, provider: Option<&ProviderCode>) -> Vec<&Region> {
        self.regions
            .values()
            .filter(|r| provider.map_or(true, |p| &r.provider == p))
            .collect()
    }

    fn list_zones(&self, provider: Option<&ProviderCode>, region: Option<&RegionId>) -> Vec<&AvailabilityZone> {
        self.zones
            .values()
            .filter(|z| provider.map_or(true, |p| &z.provider == p))
            .filter(|z| region.map_or(true, |r| &z.region == r))
            .collect()
    }
}

/// `region_name_with_provider` must be derived from provider and name.
fn check_region_id(region: &Region) -> Result<(), StoreError> {
    let expected = RegionId::compose(&region.provider, &region.region_name);
    if region.region_name_with_provider != expected {
        return Err(StoreError::integrity(
            EntityKind::Region,
            region.region_name_with_provider.0.clone(),
            format!("identifier does not match provider and name, expected '{expected}'"),
        ));
    }
    Ok(())
}

fn check_zone_id(zone: &AvailabilityZone) -> Result<(), StoreError> {
    let expected = ZoneId::compose(&zone.provider, &zone.az_name);
    if zone.az_name_with_provider != expected {
        return Err(StoreError::integrity(
            EntityKind::Zone,
            zone.az_name_with_provider.0.clone(),
            format!("identifier does not match provider and name, expected '{expected}'"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// On-disk document
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct StoreFileRef<'a> {
    version: u32,
    providers: Vec<&'a Provider>,
    regions: Vec<&'a Region>,
    zones: Vec<&'a AvailabilityZone>,
}

#[derive(Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    providers: Vec<Provider>,
    #[serde(default)]
    regions: Vec<Region>,
    #[serde(default)]
    zones: Vec<AvailabilityZone>,
}

impl StoreFile {
    fn into_data(self) -> Result<StoreData, StoreError> {
        let mut data = StoreData::default();
        for provider in self.providers {
            let key = provider.provider.clone();
            if data.providers.insert(key.clone(), provider).is_some() {
                return Err(StoreError::integrity(EntityKind::Provider, key.to_string(), "duplicate identifier"));
            }
        }
        for region in self.regions {
            let key = region.region_name_with_provider.clone();
            if data.regions.insert(key.clone(), region).is_some() {
                return Err(StoreError::integrity(EntityKind::Region, key.0, "duplicate identifier"));
            }
        }
        for zone in self.zones {
            let key = zone.az_name_with_provider.clone();
            if data.zones.insert(key.clone(), zone).is_some() {
                return Err(StoreError::integrity(EntityKind::Zone, key.0, "duplicate identifier"));
            }
        }
        data.check_integrity()?;
        Ok(data)
    }
}

/// `<root>/store.json` — pure, no I/O.
pub fn store_path_at(root: &Path) -> PathBuf {
    root.join("store.json")
}

fn persist(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let doc = StoreFileRef {
        version: STORE_VERSION,
        providers: data.providers.values().collect(),
        regions: data.regions.values().collect(),
        zones: data.zones.values().collect(),
    };
    let mut json = serde_json::to_string_pretty(&doc)?;
    json.push('\n');

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// Staged writes of one all-or-nothing batch. See [`Store::transaction`].
#[derive(Debug)]
pub struct Transaction {
    staged: StoreData,
}

impl Transaction {
    pub fn upsert_provider(&mut self, provider: Provider) -> UpsertOutcome {
        self.staged.upsert_provider(provider)
    }

    pub fn upsert_region(&mut self, region: Region) -> Result<UpsertOutcome, StoreError> {
        self.staged.upsert_region(region)
    }

    pub fn upsert_zone(&mut self, zone: AvailabilityZone) -> Result<UpsertOutcome, StoreError> {
        self.staged.upsert_zone(zone)
    }

    /// Cascade delete: zones, then regions, then the provider.
    pub fn delete_provider(&mut self, provider: &ProviderCode) -> Result<PruneReport, StoreError> {
        self.staged.delete_provider(provider)
    }

    /// Delete the provider's regions and zones that are not in `live`.
    pub fn prune_provider(&mut self, provider: &ProviderCode, live: &LiveSet) -> Result<PruneReport, StoreError> {
        self.staged.prune_provider(provider, live)
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.staged.regions.get(id)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The reconciliation store. See the module docs for the write model.
#[derive(Debug)]
pub struct Store {
    path: Option<PathBuf>,
    data: StoreData,
}

impl Store {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: StoreData::default(),
        }
    }

    /// Open the store document at `path`.
    ///
    /// A missing file yields an empty store that will be created on first
    /// commit. A malformed file returns `StoreError::Parse`; a file whose
    /// records break referential integrity returns `StoreError::Integrity`.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self {
                path: Some(path.to_path_buf()),
                data: StoreData::default(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let file: StoreFile = serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        if file.version != STORE_VERSION {
            tracing::warn!("store {} has version {}, expected {STORE_VERSION}", path.display(), file.version);
        }
        Ok(Self {
            path: Some(path.to_path_buf()),
            data: file.into_data()?,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against a staged copy and commit it atomically.
    ///
    /// The staged data is committed only if `f` returns `Ok` and the result
    /// passes [`Store::check_integrity`]. On commit the document is written
    /// to disk (for file-backed stores) before the in-memory state is
    /// replaced, so a failed write leaves both untouched.
    pub fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut tx = Transaction {
            staged: self.data.clone(),
        };
        let value = match f(&mut tx) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!("transaction rolled back");
                return Err(err);
            }
        };
        if tx.staged == self.data {
            return Ok(value);
        }
        tx.staged.check_integrity()?;
        if let Some(path) = &self.path {
            persist(path, &tx.staged)?;
        }
        self.data = tx.staged;
        Ok(value)
    }

    pub fn upsert_provider(&mut self, provider: Provider) -> Result<UpsertOutcome, StoreError> {
        self.transaction(|tx| Ok(tx.upsert_provider(provider)))
    }

    pub fn upsert_region(&mut self, region: Region) -> Result<UpsertOutcome, StoreError> {
        self.transaction(|tx| tx.upsert_region(region))
    }

    pub fn upsert_zone(&mut self, zone: AvailabilityZone) -> Result<UpsertOutcome, StoreError> {
        self.transaction(|tx| tx.upsert_zone(zone))
    }

    pub fn delete_provider(&mut self, provider: &ProviderCode) -> Result<PruneReport, StoreError> {
        self.transaction(|tx| tx.delete_provider(provider))
    }

    pub fn prune_provider(&mut self, provider: &ProviderCode, live: &LiveSet) -> Result<PruneReport, StoreError> {
        self.transaction(|tx| tx.prune_provider(provider, live))
    }

    pub fn provider(&self, code: &ProviderCode) -> Option<&Provider> {
        self.data.providers.get(code)
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.data.regions.get(id)
    }

    pub fn zone(&self, id: &ZoneId) -> Option<&AvailabilityZone> {
        self.data.zones.get(id)
    }

    /// All providers, identifier ascending.
    pub fn list_providers(&self) -> Vec<&Provider> {
        self.data.providers.values().collect()
    }

    /// Regions, optionally of one provider, identifier ascending.
    pub fn list_regions(&self, provider: Option<&ProviderCode>) -> Vec<&Region> {
        self.data.list_regions(provider)
    }

    /// Zones, optionally filtered by provider and/or region, identifier ascending.
    pub fn list_zones(&self, provider: Option<&ProviderCode>, region: Option<&RegionId>) -> Vec<&AvailabilityZone> {
        self.data.list_zones(provider, region)
    }

    pub fn is_empty(&self) -> bool {
        self.data.providers.is_empty()
    }

    pub fn check_integrity(&self) -> Result<(), StoreError> {
        self.data.check_integrity()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
