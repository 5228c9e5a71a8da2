//! # cloudzones-sync
//!
//! Sync orchestration, snapshot export, seed loading and the hash-gated
//! fixture writer.
//!
//! [`Pipeline::run`] syncs every configured provider into a store, one
//! transaction per provider. [`export()`] renders a deterministic snapshot and
//! [`write_fixtures`] keeps the on-disk fixture set current without touching
//! unchanged files.

pub mod diff;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod seed;
pub mod writer;

pub use diff::{diff_fixtures, FixtureDiff};
pub use error::SyncError;
pub use export::{export, render, snapshot, ExportFormat, ExportOptions, Record, Reference, Snapshot};
pub use pipeline::{
    now_stamp, Pipeline, ProviderOutcome, ProviderSummary, SyncOptions, SyncRun, SyncScope, UpsertCounts,
};
pub use seed::{load_snapshot, load_snapshot_file, SeedReport};
pub use writer::{atomic_write, fixture_plan, write_fixtures, FixtureSpec, WriteResult};
