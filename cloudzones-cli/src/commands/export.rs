//! `cloudzones export` — deterministic snapshot to stdout or a file.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cloudzones_core::types::EntityKind;
use cloudzones_sync::{atomic_write, export, ExportFormat, ExportOptions, WriteResult};

use super::Workspace;

/// Arguments for `cloudzones export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export only one entity type (default: whole store, tagged by model).
    #[arg(long, value_name = "TYPE")]
    pub entity: Option<EntityKind>,

    /// Render provider references as `["aws"]`.
    #[arg(long)]
    pub natural_provider: bool,

    /// Render zone region references as `["aws", "us-east-1"]`.
    #[arg(long)]
    pub natural_region: bool,

    /// json | yaml
    #[arg(long, default_value = "json")]
    pub format: ExportFormat,

    /// Write here instead of stdout; an unchanged file is left untouched.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl ExportArgs {
    pub fn run(self, workspace: &Workspace) -> Result<()> {
        let (_, store) = workspace.load()?;
        let options = ExportOptions {
            natural_provider: self.natural_provider,
            natural_region: self.natural_region,
        };
        let rendered = export(&store, self.entity, options, self.format).context("export failed")?;

        match self.output {
            Some(path) => match atomic_write(&path, &rendered, false)? {
                WriteResult::Unchanged { path } => println!("· {} unchanged", path.display()),
                other => println!("✎ {}", other.path().display()),
            },
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.as_bytes()).context("failed to write stdout")?;
            }
        }
        Ok(())
    }
}
