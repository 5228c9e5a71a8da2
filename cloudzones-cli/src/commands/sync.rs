//! `cloudzones sync` — ingest raw listings into the store.

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::Args;
use colored::Colorize;

use cloudzones_core::types::ProviderCode;
use cloudzones_sync::{Pipeline, SyncOptions, SyncRun, SyncScope, WriteResult};

use super::Workspace;

/// Arguments for `cloudzones sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Sync only this provider (repeatable; default: every configured one).
    #[arg(long = "provider", value_name = "CODE")]
    pub providers: Vec<String>,

    /// Delete regions and zones missing from the fresh listing.
    #[arg(long)]
    pub prune: bool,

    /// Write the fixture set after syncing.
    #[arg(long)]
    pub fixtures: bool,

    /// Pin `record_last_synced` (RFC 3339) instead of using the current time.
    #[arg(long, value_name = "TS")]
    pub synced_at: Option<String>,
}

impl SyncArgs {
    pub fn run(self, workspace: &Workspace) -> Result<()> {
        if let Some(ts) = &self.synced_at {
            DateTime::parse_from_rfc3339(ts).with_context(|| format!("--synced-at '{ts}' is not RFC 3339"))?;
        }

        let (config, mut store) = workspace.load()?;
        let scope = if self.providers.is_empty() {
            SyncScope::All
        } else {
            SyncScope::Providers(self.providers.iter().map(|p| ProviderCode::from(p.as_str())).collect())
        };
        let options = SyncOptions {
            prune: self.prune,
            synced_at: self.synced_at,
            fixtures_dir: self.fixtures.then(|| config.fixtures_dir.clone()),
            ..SyncOptions::default()
        };

        let run = Pipeline::default()
            .run(&config, &mut store, &scope, &options)
            .context("sync failed")?;
        print_run(&run);

        let failed = run.failures().count();
        if failed > 0 {
            bail!("{failed} provider(s) failed to sync");
        }
        if let Err(err) = run.fixtures {
            return Err(err).context("store updated but fixtures were not written");
        }
        Ok(())
    }
}

fn print_run(run: &SyncRun) {
    println!("synced at {}", run.synced_at);
    for outcome in &run.outcomes {
        match &outcome.result {
            Ok(summary) => {
                println!(
                    "{} {:<6} regions {} new, {} updated, {} unchanged | zones {} new, {} updated, {} unchanged",
                    "✓".green(),
                    summary.provider,
                    summary.regions.inserted,
                    summary.regions.updated,
                    summary.regions.unchanged,
                    summary.zones.inserted,
                    summary.zones.updated,
                    summary.zones.unchanged,
                );
                if !summary.pruned.is_empty() {
                    for id in &summary.pruned.regions {
                        println!("  −  region {id}");
                    }
                    for id in &summary.pruned.zones {
                        println!("  −  zone {id}");
                    }
                }
            }
            Err(err) => eprintln!("{} {:<6} {err}", "✗".red(), outcome.provider),
        }
    }
    let Ok(writes) = &run.fixtures else {
        return;
    };
    for write in writes {
        match write {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
            WriteResult::Unchanged { path } => println!("  ·  {}", path.display()),
        }
    }
}
