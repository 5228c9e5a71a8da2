//! `config.yaml` — configured providers and where their raw data lives.
//!
//! # Layout
//!
//! ```text
//! ~/.cloudzones/
//!   config.yaml
//!   store.json
//!   region_data/<raw provider listings>
//!   fixtures/
//! ```
//!
//! Relative paths in the config resolve against the root directory that holds
//! `config.yaml`. Functions taking a root have an `_at` form; only
//! [`default_root`] derives it from `dirs::home_dir()`. Tests only call the
//! `_at` forms.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{config_io_err, ConfigError};
use crate::types::ProviderCode;

pub const CONFIG_FILE: &str = "config.yaml";

/// One configured provider and its raw listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSource {
    pub code: ProviderCode,
    /// Raw listing file; relative to the config root unless absolute.
    pub source: PathBuf,
}

/// Parsed `config.yaml`, with relative paths already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_store")]
    pub store: PathBuf,
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: PathBuf,
    pub providers: Vec<ProviderSource>,
}

fn default_store() -> PathBuf {
    PathBuf::from("store.json")
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from("fixtures")
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            fixtures_dir: default_fixtures_dir(),
            providers: vec![
                ProviderSource {
                    code: ProviderCode::from("aws"),
                    source: PathBuf::from("region_data/aws_regions.json"),
                },
                ProviderSource {
                    code: ProviderCode::from("gcp"),
                    source: PathBuf::from("region_data/unparsed_gcloud_output.json"),
                },
            ],
        }
    }
}

impl SyncConfig {
    pub fn provider_codes(&self) -> Vec<ProviderCode> {
        self.providers.iter().map(|p| p.code.clone()).collect()
    }

    pub fn source_for(&self, code: &ProviderCode) -> Option<&ProviderSource> {
        self.providers.iter().find(|p| &p.code == code)
    }

    fn resolve(mut self, root: &Path) -> Self {
        self.store = root.join(&self.store);
        self.fixtures_dir = root.join(&self.fixtures_dir);
        for provider in &mut self.providers {
            provider.source = root.join(&provider.source);
        }
        self
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::NoProviders {
                path: path.to_path_buf(),
            });
        }
        let mut seen = BTreeSet::new();
        for provider in &self.providers {
            if !seen.insert(&provider.code) {
                return Err(ConfigError::DuplicateProvider(provider.code.clone()));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.cloudzones`
pub fn default_root_at(home: &Path) -> PathBuf {
    home.join(".cloudzones")
}

/// `~/.cloudzones` (convenience — uses `dirs::home_dir()`).
pub fn default_root() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| default_root_at(&home))
        .ok_or(ConfigError::HomeNotFound)
}

/// `<root>/config.yaml` — pure, no I/O.
pub fn config_path_at(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Load / init
// ---------------------------------------------------------------------------

/// Load `<root>/config.yaml` and resolve its relative paths against `root`.
///
/// Returns `ConfigError::NotFound` if absent and `ConfigError::Parse` (with
/// path and line context) if malformed.
pub fn load_at(root: &Path) -> Result<SyncConfig, ConfigError> {
    let path = config_path_at(root);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| config_io_err(&path, e))?;
    let config: SyncConfig =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path: path.clone(), source: e })?;
    config.validate(&path)?;
    Ok(config.resolve(root))
}

/// Write a default `<root>/config.yaml` listing the built-in providers.
///
/// Idempotent: an existing config is loaded and returned unchanged. Writes go
/// to a `.tmp` sibling first and are renamed into place.
pub fn init_at(root: &Path) -> Result<SyncConfig, ConfigError> {
    let path = config_path_at(root);
    if path.exists() {
        return load_at(root);
    }

    std::fs::create_dir_all(root).map_err(|e| config_io_err(root, e))?;
    let yaml = serde_yaml::to_string(&SyncConfig::default())?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| config_io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| config_io_err(&path, e))?;
    tracing::info!("wrote {}", path.display());
    load_at(root)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
