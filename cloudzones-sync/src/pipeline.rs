//! Sync orchestrator: raw blob → adapter → canonicalizer → store → fixtures.
//!
//! Each provider is synced in its own store transaction (provider, then
//! regions, then zones, then the optional prune). A provider whose input
//! fails to parse or canonicalize, or whose batch breaks an integrity rule,
//! is rolled back and reported; the run moves on to the next provider.

use std::path::PathBuf;

use chrono::Utc;

use cloudzones_core::{
    store::{PruneReport, Store, UpsertOutcome},
    types::{Provider, ProviderCode},
    SyncConfig,
};
use cloudzones_ingest::{live_set, AdapterRegistry, Canonicalizer, IngestError};

use crate::error::{io_err, SyncError};
use crate::export::ExportFormat;
use crate::writer::{write_fixtures, WriteResult};

/// `record_last_synced` format for pipeline-stamped records.
pub const SYNCED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Current UTC time in [`SYNCED_AT_FORMAT`].
pub fn now_stamp() -> String {
    Utc::now().format(SYNCED_AT_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Options / results
// ---------------------------------------------------------------------------

/// Which configured providers a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncScope {
    All,
    Providers(Vec<ProviderCode>),
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Delete records the fresh listing no longer contains.
    pub prune: bool,
    /// Pin `record_last_synced`; defaults to [`now_stamp`] at run start.
    pub synced_at: Option<String>,
    /// Write the fixture set here after syncing.
    pub fixtures_dir: Option<PathBuf>,
    pub fixtures_format: ExportFormat,
}

/// Per-entity upsert tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl UpsertCounts {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn changed(&self) -> usize {
        self.inserted + self.updated
    }
}

/// What one provider's committed batch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSummary {
    pub provider: ProviderCode,
    pub regions: UpsertCounts,
    pub zones: UpsertCounts,
    pub pruned: PruneReport,
}

#[derive(Debug)]
pub struct ProviderOutcome {
    pub provider: ProviderCode,
    pub result: Result<ProviderSummary, SyncError>,
}

/// Outcome of a whole run.
///
/// Provider batches commit before fixtures are written, so a fixture failure
/// is carried here next to the outcomes instead of replacing them.
#[derive(Debug)]
pub struct SyncRun {
    pub synced_at: String,
    pub outcomes: Vec<ProviderOutcome>,
    pub fixtures: Result<Vec<WriteResult>, SyncError>,
}

impl SyncRun {
    pub fn failures(&self) -> impl Iterator<Item = &ProviderOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none() && self.fixtures.is_ok()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Adapter table + naming table.
#[derive(Default)]
pub struct Pipeline {
    adapters: AdapterRegistry,
    canonicalizer: Canonicalizer,
}

impl Pipeline {
    /// Parse, canonicalize and commit one provider's raw listing as a single
    /// transaction.
    pub fn sync_provider(
        &self,
        store: &mut Store,
        provider: &ProviderCode,
        raw: &str,
        synced_at: &str,
        prune: bool,
    ) -> Result<ProviderSummary, SyncError> {
        let parsed = self.adapters.parse(raw, provider)?;
        let batch = self.canonicalizer.canonicalize(provider, &parsed, synced_at)?;
        let live = live_set(&batch);
        let (regions, zones): (Vec<_>, Vec<_>) = batch.into_iter().map(|c| (c.region, c.zones)).unzip();

        store.transaction(|tx| -> Result<ProviderSummary, SyncError> {
            tx.upsert_provider(Provider::new(provider.clone()));
            let mut summary = ProviderSummary {
                provider: provider.clone(),
                regions: UpsertCounts::default(),
                zones: UpsertCounts::default(),
                pruned: PruneReport::default(),
            };
            for region in regions {
                summary.regions.record(tx.upsert_region(region)?);
            }
            for zone in zones.into_iter().flatten() {
                summary.zones.record(tx.upsert_zone(zone)?);
            }
            if prune {
                summary.pruned = tx.prune_provider(provider, &live)?;
            }
            Ok(summary)
        })
    }

    /// Sync raw blobs already in memory, one isolated batch per provider.
    pub fn sync_blobs<'a, I>(&self, store: &mut Store, blobs: I, options: &SyncOptions) -> Result<SyncRun, SyncError>
    where
        I: IntoIterator<Item = (ProviderCode, &'a str)>,
    {
        let synced_at = options.synced_at.clone().unwrap_or_else(now_stamp);
        let mut outcomes = Vec::new();
        for (provider, raw) in blobs {
            let result = self.sync_provider(store, &provider, raw, &synced_at, options.prune);
            outcomes.push(self.finish(provider, result));
        }
        Ok(self.complete(store, synced_at, outcomes, options))
    }

    /// Sync every provider of `scope` from the raw files named in `config`.
    ///
    /// A scope naming a provider that is not configured fails before anything
    /// is read. An unreadable raw file fails only its provider.
    pub fn run(
        &self,
        config: &SyncConfig,
        store: &mut Store,
        scope: &SyncScope,
        options: &SyncOptions,
    ) -> Result<SyncRun, SyncError> {
        let sources = match scope {
            SyncScope::All => config.providers.iter().collect::<Vec<_>>(),
            SyncScope::Providers(codes) => codes
                .iter()
                .map(|code| {
                    config
                        .source_for(code)
                        .ok_or_else(|| SyncError::Ingest(IngestError::UnknownProvider(code.clone())))
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        let synced_at = options.synced_at.clone().unwrap_or_else(now_stamp);
        let mut outcomes = Vec::with_capacity(sources.len());
        for source in sources {
            let result = std::fs::read_to_string(&source.source)
                .map_err(|e| io_err(&source.source, e))
                .and_then(|raw| self.sync_provider(store, &source.code, &raw, &synced_at, options.prune));
            outcomes.push(self.finish(source.code.clone(), result));
        }
        Ok(self.complete(store, synced_at, outcomes, options))
    }

    fn finish(&self, provider: ProviderCode, result: Result<ProviderSummary, SyncError>) -> ProviderOutcome {
        let result = match result {
            Ok(summary) => {
                tracing::info!(
                    "{provider}: regions +{} ~{} ={}, zones +{} ~{} ={}, pruned {} region(s) {} zone(s)",
                    summary.regions.inserted,
                    summary.regions.updated,
                    summary.regions.unchanged,
                    summary.zones.inserted,
                    summary.zones.updated,
                    summary.zones.unchanged,
                    summary.pruned.regions.len(),
                    summary.pruned.zones.len(),
                );
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!("{provider}: batch rolled back: {err}");
                Err(SyncError::Provider {
                    provider: provider.clone(),
                    source: Box::new(err),
                })
            }
        };
        ProviderOutcome { provider, result }
    }

    fn complete(
        &self,
        store: &Store,
        synced_at: String,
        outcomes: Vec<ProviderOutcome>,
        options: &SyncOptions,
    ) -> SyncRun {
        let fixtures = match &options.fixtures_dir {
            Some(dir) => write_fixtures(store, dir, options.fixtures_format, false),
            None => Ok(Vec::new()),
        };
        if let Err(err) = &fixtures {
            tracing::warn!("fixtures not written: {err}");
        }
        SyncRun {
            synced_at,
            outcomes,
            fixtures,
        }
    }
}
