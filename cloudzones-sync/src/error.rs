//! Error types for cloudzones-sync.

use std::path::PathBuf;

use thiserror::Error;

use cloudzones_core::{types::ProviderCode, ConfigError, StoreError};
use cloudzones_ingest::IngestError;

/// All errors that can arise from sync, export and seed operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the reconciliation store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Adapter or canonicalizer failure.
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// One provider's batch failed and was rolled back.
    #[error("sync of provider '{provider}' failed: {source}")]
    Provider {
        provider: ProviderCode,
        #[source]
        source: Box<SyncError>,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A seed document references something it cannot resolve.
    #[error("invalid seed document: {reason}")]
    Seed { reason: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
