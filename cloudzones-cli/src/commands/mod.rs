//! Subcommand handlers. Each `*Args` struct owns its `run`.

pub mod check;
pub mod delete;
pub mod diff;
pub mod export;
pub mod fixtures;
pub mod init;
pub mod list;
pub mod seed;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};

use cloudzones_core::{config, store::Store, SyncConfig};

/// The catalog root every command operates on.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
}

impl Workspace {
    /// `--root` if given, otherwise `~/.cloudzones`.
    pub fn resolve(root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(root) => root,
            None => config::default_root().context("could not determine home directory")?,
        };
        Ok(Self { root })
    }

    pub fn config(&self) -> Result<SyncConfig> {
        config::load_at(&self.root).with_context(|| format!("failed to load config under {}", self.root.display()))
    }

    pub fn open_store(&self, config: &SyncConfig) -> Result<Store> {
        Store::open_at(&config.store).with_context(|| format!("failed to open store {}", config.store.display()))
    }

    /// Config and store together, the common case.
    pub fn load(&self) -> Result<(SyncConfig, Store)> {
        let config = self.config()?;
        let store = self.open_store(&config)?;
        Ok((config, store))
    }
}
