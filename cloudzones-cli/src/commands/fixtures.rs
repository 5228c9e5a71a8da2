//! `cloudzones fixtures` — write the fixture set.

use anyhow::{Context, Result};
use clap::Args;

use cloudzones_sync::{write_fixtures, ExportFormat, WriteResult};

use super::Workspace;

/// Arguments for `cloudzones fixtures`.
#[derive(Args, Debug)]
pub struct FixturesArgs {
    /// Show what would be written without writing any files.
    #[arg(long)]
    pub dry_run: bool,

    /// json | yaml
    #[arg(long, default_value = "json")]
    pub format: ExportFormat,
}

impl FixturesArgs {
    pub fn run(self, workspace: &Workspace) -> Result<()> {
        let (config, store) = workspace.load()?;
        let writes = write_fixtures(&store, &config.fixtures_dir, self.format, self.dry_run)
            .with_context(|| format!("failed to write fixtures to {}", config.fixtures_dir.display()))?;

        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        let changed = writes
            .iter()
            .filter(|w| !matches!(w, WriteResult::Unchanged { .. }))
            .count();
        println!(
            "{prefix}✓ fixtures ({changed} written, {} unchanged)",
            writes.len() - changed
        );
        for w in &writes {
            match w {
                WriteResult::Written { path } => println!("  ✎  {}", path.display()),
                WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
                WriteResult::Unchanged { path } => println!("  ·  {}", path.display()),
            }
        }
        Ok(())
    }
}
