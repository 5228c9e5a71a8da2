//! Raw source adapters.
//!
//! An adapter turns one provider's raw listing into [`IntermediateRegion`]s.
//! It is the only code that knows the raw shape. Adapters are pure: no I/O,
//! no store access, identical output for identical input. A record that
//! cannot be fully parsed fails the whole parse with
//! [`IngestError::MalformedInput`]; nothing is dropped or defaulted.
//!
//! Adapters are looked up through [`AdapterRegistry`], a closed table keyed by
//! provider code. Adding a provider means adding a module here and one
//! `register` call in [`AdapterRegistry::builtin`].

pub mod aws;
pub mod gcp;

use std::collections::BTreeMap;

use cloudzones_core::types::ProviderCode;
use serde_json::Value;

use crate::error::{malformed, IngestError};

pub use aws::AwsAdapter;
pub use gcp::GcpAdapter;

// ---------------------------------------------------------------------------
// Intermediate records
// ---------------------------------------------------------------------------

/// A zone as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateZone {
    pub az_name: String,
    /// Provider-assigned zone id, when the listing carries one.
    pub az_id: Option<String>,
}

/// A region and its zones, provider-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateRegion {
    pub region_name: String,
    pub zones: Vec<IntermediateZone>,
}

// ---------------------------------------------------------------------------
// Adapter trait + table
// ---------------------------------------------------------------------------

/// Parses one provider's raw listing format.
pub trait SourceAdapter: Send + Sync {
    /// Provider code this adapter is registered under.
    fn provider(&self) -> ProviderCode;

    fn parse(&self, raw: &str) -> Result<Vec<IntermediateRegion>, IngestError>;
}

/// Provider code → adapter.
pub struct AdapterRegistry {
    adapters: BTreeMap<ProviderCode, Box<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn empty() -> Self {
        Self {
            adapters: BTreeMap::new(),
        }
    }

    /// Table with every built-in adapter (`aws`, `gcp`).
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(AwsAdapter));
        registry.register(Box::new(GcpAdapter));
        registry
    }

    /// Register `adapter` under its provider code, replacing any previous one.
    pub fn register(&mut self, adapter: Box<dyn SourceAdapter>) {
        self.adapters.insert(adapter.provider(), adapter);
    }

    pub fn get(&self, provider: &ProviderCode) -> Result<&dyn SourceAdapter, IngestError> {
        self.adapters
            .get(provider)
            .map(|a| &**a)
            .ok_or_else(|| IngestError::UnknownProvider(provider.clone()))
    }

    /// `parse(raw_blob, provider_code)` through the registered adapter.
    pub fn parse(&self, raw: &str, provider: &ProviderCode) -> Result<Vec<IntermediateRegion>, IngestError> {
        let regions = self.get(provider)?.parse(raw)?;
        tracing::debug!("{provider}: parsed {} region(s)", regions.len());
        Ok(regions)
    }

    pub fn providers(&self) -> impl Iterator<Item = &ProviderCode> {
        self.adapters.keys()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) fn parse_document(provider: &ProviderCode, raw: &str) -> Result<Value, IngestError> {
    serde_json::from_str(raw).map_err(|e| malformed(provider, "document", e.to_string()))
}

/// A required, non-empty, whitespace-free name.
pub(crate) fn name_value(
    provider: &ProviderCode,
    record: &str,
    field: &str,
    value: Option<&Value>,
) -> Result<String, IngestError> {
    let Some(value) = value else {
        return Err(malformed(provider, record, format!("missing `{field}`")));
    };
    let Some(name) = value.as_str() else {
        return Err(malformed(provider, record, format!("`{field}` is not a string")));
    };
    if name.is_empty() {
        return Err(malformed(provider, record, format!("`{field}` is empty")));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(malformed(provider, record, format!("`{field}` contains whitespace: '{name}'")));
    }
    Ok(name.to_string())
}

/// The `zones` array of a region record.
pub(crate) fn zones_array<'a>(
    provider: &ProviderCode,
    record: &str,
    body: &'a serde_json::Map<String, Value>,
) -> Result<&'a Vec<Value>, IngestError> {
    match body.get("zones") {
        None => Err(malformed(provider, record, "missing `zones`")),
        Some(Value::Array(zones)) => Ok(zones),
        Some(_) => Err(malformed(provider, record, "`zones` is not an array")),
    }
}
