//! cloudzones — cloud region and availability-zone catalog.
//!
//! # Usage
//!
//! ```text
//! cloudzones init
//! cloudzones sync [--provider <code>]... [--prune] [--fixtures] [--synced-at <ts>]
//! cloudzones list providers|regions|zones [--provider <code>] [--region <id>] [--json]
//! cloudzones export [--entity <type>] [--natural-provider] [--natural-region] [--format json|yaml] [--output <path>]
//! cloudzones fixtures [--dry-run] [--format json|yaml]
//! cloudzones diff [--format json|yaml]
//! cloudzones seed <document> [--format json|yaml]
//! cloudzones delete-provider <code>
//! cloudzones check
//! ```
//!
//! Every command accepts `--root <dir>` (default `~/.cloudzones`).

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    check::CheckArgs, delete::DeleteProviderArgs, diff::DiffArgs, export::ExportArgs, fixtures::FixturesArgs,
    init::InitArgs, list::ListArgs, seed::SeedArgs, sync::SyncArgs, Workspace,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "cloudzones",
    version,
    about = "Sync and export a catalog of cloud regions and availability zones",
    long_about = None,
)]
struct Cli {
    /// Catalog root holding config.yaml and the store (default: ~/.cloudzones).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default config.yaml listing the built-in providers.
    Init(InitArgs),

    /// Ingest raw provider listings into the store.
    Sync(SyncArgs),

    /// List providers, regions or zones.
    List(ListArgs),

    /// Print or write a deterministic snapshot of the store.
    Export(ExportArgs),

    /// Write the fixture set, skipping unchanged files.
    Fixtures(FixturesArgs),

    /// Show unified diff of what `fixtures` would write.
    Diff(DiffArgs),

    /// Load a whole-store snapshot into the store.
    Seed(SeedArgs),

    /// Delete a provider with all of its regions and zones.
    DeleteProvider(DeleteProviderArgs),

    /// Verify referential integrity of the store.
    Check(CheckArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let workspace = Workspace::resolve(cli.root)?;
    tracing::debug!("catalog root: {}", workspace.root.display());

    match cli.command {
        Commands::Init(args) => args.run(&workspace),
        Commands::Sync(args) => args.run(&workspace),
        Commands::List(args) => args.run(&workspace),
        Commands::Export(args) => args.run(&workspace),
        Commands::Fixtures(args) => args.run(&workspace),
        Commands::Diff(args) => args.run(&workspace),
        Commands::Seed(args) => args.run(&workspace),
        Commands::DeleteProvider(args) => args.run(&workspace),
        Commands::Check(args) => args.run(&workspace),
    }
}
