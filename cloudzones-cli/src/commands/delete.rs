//! `cloudzones delete-provider <code>`

use anyhow::{Context, Result};
use clap::Args;

use cloudzones_core::types::ProviderCode;

use super::Workspace;

/// Delete a provider with all of its regions and zones.
#[derive(Args, Debug)]
pub struct DeleteProviderArgs {
    /// Provider code, e.g. aws.
    pub code: String,
}

impl DeleteProviderArgs {
    pub fn run(self, workspace: &Workspace) -> Result<()> {
        let (_, mut store) = workspace.load()?;
        let code = ProviderCode::from(self.code.as_str());
        let removed = store
            .delete_provider(&code)
            .with_context(|| format!("failed to delete provider '{code}'"))?;
        println!(
            "✓ deleted '{code}' ({} region(s), {} zone(s))",
            removed.regions.len(),
            removed.zones.len()
        );
        Ok(())
    }
}
