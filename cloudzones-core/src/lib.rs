//! cloudzones core library — domain types, the reconciliation store,
//! configuration and errors.
//!
//! - [`types`] — identifier newtypes and entity records
//! - [`error`] — [`StoreError`], [`ConfigError`]
//! - [`store`] — provider → region → zone store with upsert, prune and cascade
//! - [`config`] — `config.yaml` load / init

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::{ProviderSource, SyncConfig};
pub use error::{ConfigError, StoreError};
pub use store::{LiveSet, PruneReport, Store, Transaction, UpsertOutcome};
pub use types::{AvailabilityZone, EntityKind, Provider, ProviderCode, Region, RegionId, ZoneId};
