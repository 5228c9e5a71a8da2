//! # cloudzones-ingest
//!
//! Raw provider listings → canonical records.
//!
//! [`AdapterRegistry::parse`] turns a raw blob into provider-agnostic
//! [`IntermediateRegion`]s; [`Canonicalizer::canonicalize`] derives
//! identifiers and short names from them. Both are pure.

pub mod adapter;
pub mod canonical;
pub mod error;

pub use adapter::{AdapterRegistry, IntermediateRegion, IntermediateZone, SourceAdapter};
pub use canonical::{live_set, CanonicalRegion, Canonicalizer, NamingRule};
pub use error::IngestError;
