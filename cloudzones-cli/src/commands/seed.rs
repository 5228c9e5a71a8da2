//! `cloudzones seed <document>`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cloudzones_sync::{load_snapshot, seed::load_snapshot_file, ExportFormat};

use super::Workspace;

/// Load a whole-store snapshot (raw or natural references).
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Snapshot document produced by `cloudzones export`.
    pub document: PathBuf,

    /// json | yaml (default: from the file extension).
    #[arg(long)]
    pub format: Option<ExportFormat>,
}

impl SeedArgs {
    pub fn run(self, workspace: &Workspace) -> Result<()> {
        let (_, mut store) = workspace.load()?;
        let report = match self.format {
            Some(format) => {
                let doc = std::fs::read_to_string(&self.document)
                    .with_context(|| format!("cannot read {}", self.document.display()))?;
                load_snapshot(&mut store, &doc, format)
            }
            None => load_snapshot_file(&mut store, &self.document),
        }
        .with_context(|| format!("failed to seed from {}", self.document.display()))?;

        println!(
            "✓ seeded: providers {} new | regions {} new, {} updated | zones {} new, {} updated",
            report.providers.inserted,
            report.regions.inserted,
            report.regions.updated,
            report.zones.inserted,
            report.zones.updated,
        );
        Ok(())
    }
}
