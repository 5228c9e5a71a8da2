//! Error types for cloudzones-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{EntityKind, ProviderCode};

/// All errors that can arise from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write would leave a dangling or inconsistent reference.
    #[error("integrity error on {kind} '{id}': {reason}")]
    Integrity {
        kind: EntityKind,
        id: String,
        reason: String,
    },

    /// A cascade delete left dependents behind. Never expected; the batch is
    /// discarded when this is raised.
    #[error("cascade delete of provider '{provider}' incomplete: {detail}")]
    CascadeFailure {
        provider: ProviderCode,
        detail: String,
    },

    /// The addressed record does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    /// Underlying I/O failure, with the path being read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store document on disk is not valid JSON for the store schema.
    #[error("failed to parse store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error (write path).
    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn integrity(kind: EntityKind, id: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Integrity {
            kind,
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// All errors that can arise from loading or scaffolding `config.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (init path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path and serde_yaml's line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`; cannot locate `~/.cloudzones/`.
    #[error("cannot determine home directory; set $HOME or pass --root")]
    HomeNotFound,

    #[error("config not found at {path}; run `cloudzones init` first")]
    NotFound { path: PathBuf },

    #[error("provider '{0}' is configured more than once")]
    DuplicateProvider(ProviderCode),

    #[error("config at {path} lists no providers")]
    NoProviders { path: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn config_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
