//! `cloudzones diff`

use anyhow::{Context, Result};
use clap::Args;

use cloudzones_sync::{diff_fixtures, ExportFormat};

use super::Workspace;

/// Show unified diff of what `fixtures` would write.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// json | yaml
    #[arg(long, default_value = "json")]
    pub format: ExportFormat,
}

impl DiffArgs {
    pub fn run(self, workspace: &Workspace) -> Result<()> {
        let (config, store) = workspace.load()?;
        let diffs = diff_fixtures(&store, &config.fixtures_dir, self.format).context("diff failed")?;

        if diffs.is_empty() {
            println!("✓ fixtures are up to date");
            return Ok(());
        }
        for diff in diffs {
            print!("{}", diff.unified_diff);
        }
        Ok(())
    }
}
