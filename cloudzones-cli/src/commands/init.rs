//! `cloudzones init`

use anyhow::{Context, Result};
use clap::Args;

use cloudzones_core::config;

use super::Workspace;

/// Write a default config.yaml (an existing one is left alone).
#[derive(Args, Debug)]
pub struct InitArgs {}

impl InitArgs {
    pub fn run(self, workspace: &Workspace) -> Result<()> {
        let existed = config::config_path_at(&workspace.root).exists();
        let config = config::init_at(&workspace.root)
            .with_context(|| format!("failed to init {}", workspace.root.display()))?;

        let verb = if existed { "Using existing" } else { "Wrote" };
        println!("✓ {verb} {}", config::config_path_at(&workspace.root).display());
        for provider in &config.providers {
            println!("  {:<6} {}", provider.code, provider.source.display());
        }
        Ok(())
    }
}
