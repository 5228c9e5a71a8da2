//! Error types for cloudzones-ingest.

use cloudzones_core::types::ProviderCode;
use thiserror::Error;

/// Errors from parsing raw listings and deriving canonical records.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A raw record is missing a required field or has the wrong shape.
    /// The record is rejected; no defaults are guessed.
    #[error("malformed {provider} input at {record}: {reason}")]
    MalformedInput {
        provider: ProviderCode,
        record: String,
        reason: String,
    },

    /// No adapter or naming rule is registered for the provider code.
    #[error("unknown provider '{0}'")]
    UnknownProvider(ProviderCode),

    /// The provider's naming rule cannot derive a short name.
    #[error("cannot derive a {provider} short name for '{name}'")]
    UnrecognizedName { provider: ProviderCode, name: String },

    /// Two records in one batch resolve to the same identifier.
    #[error("duplicate {provider} identifier '{id}' in one batch")]
    DuplicateIdentifier { provider: ProviderCode, id: String },
}

pub(crate) fn malformed(
    provider: &ProviderCode,
    record: impl Into<String>,
    reason: impl Into<String>,
) -> IngestError {
    IngestError::MalformedInput {
        provider: provider.clone(),
        record: record.into(),
        reason: reason.into(),
    }
}
