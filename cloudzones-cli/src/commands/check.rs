//! `cloudzones check`

use anyhow::{Context, Result};
use clap::Args;

use super::Workspace;

/// Verify referential integrity of the store.
#[derive(Args, Debug)]
pub struct CheckArgs {}

impl CheckArgs {
    pub fn run(self, workspace: &Workspace) -> Result<()> {
        // Opening already validates the document; check again on the loaded data.
        let (_, store) = workspace.load()?;
        store.check_integrity().context("integrity check failed")?;
        println!(
            "✓ store ok: {} provider(s), {} region(s), {} zone(s)",
            store.list_providers().len(),
            store.list_regions(None).len(),
            store.list_zones(None, None).len()
        );
        Ok(())
    }
}
