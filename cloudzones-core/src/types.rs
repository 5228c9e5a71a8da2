//! Domain types for the cloud topology catalog.
//!
//! Every entity is keyed by a stable string identifier; there are no
//! surrogate numeric keys. Composite identifiers are built with
//! [`RegionId::compose`] and [`ZoneId::compose`] so every component derives
//! them the same way.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Lowercase provider code, e.g. `aws`. Doubles as the provider identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ProviderCode(String);

impl ProviderCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProviderCode {
    fn from(s: String) -> Self {
        Self(s.trim().to_ascii_lowercase())
    }
}

impl From<&str> for ProviderCode {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<ProviderCode> for String {
    fn from(code: ProviderCode) -> Self {
        code.0
    }
}

/// `region_name_with_provider`, e.g. `aws-us-east-1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn compose(provider: &ProviderCode, region_name: &str) -> Self {
        Self(format!("{provider}-{region_name}"))
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// `az_name_with_provider`, e.g. `aws-us-east-1a`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn compose(provider: &ProviderCode, az_name: &str) -> Self {
        Self(format!("{provider}-{az_name}"))
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ZoneId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// `"{provider}-{short_name}"`, shared by regions and zones.
pub fn with_provider(provider: &ProviderCode, short_name: &str) -> String {
    format!("{provider}-{short_name}")
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The three entity types held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Provider,
    Region,
    Zone,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Provider => write!(f, "provider"),
            EntityKind::Region => write!(f, "region"),
            EntityKind::Zone => write!(f, "zone"),
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "provider" | "providers" => Ok(EntityKind::Provider),
            "region" | "regions" => Ok(EntityKind::Region),
            "zone" | "zones" | "az" => Ok(EntityKind::Zone),
            other => Err(format!(
                "unknown entity type '{other}'; expected: provider, region, zone"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A cloud platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub provider: ProviderCode,
}

impl Provider {
    pub fn new(code: impl Into<ProviderCode>) -> Self {
        Self {
            provider: code.into(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.provider.as_str().to_ascii_uppercase())
    }
}

/// A provider-defined grouping of availability zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub region_name_with_provider: RegionId,
    pub provider: ProviderCode,
    pub record_last_synced: String,
    pub region_name: String,
    pub region_short_name: String,
    pub region_short_name_with_provider: String,
}

impl Region {
    pub fn id(&self) -> &RegionId {
        &self.region_name_with_provider
    }

    /// Field equality ignoring `record_last_synced`.
    pub fn same_content(&self, other: &Region) -> bool {
        self.region_name_with_provider == other.region_name_with_provider
            && self.provider == other.provider
            && self.region_name == other.region_name
            && self.region_short_name == other.region_short_name
            && self.region_short_name_with_provider == other.region_short_name_with_provider
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.region_name_with_provider.fmt(f)
    }
}

/// An isolated failure domain inside a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub az_name_with_provider: ZoneId,
    pub provider: ProviderCode,
    pub region: RegionId,
    pub record_last_synced: String,
    pub az_name: String,
    pub az_short_name: String,
    /// Provider-assigned zone id; not every provider exposes one.
    #[serde(default)]
    pub az_id: Option<String>,
    pub az_short_name_with_provider: String,
}

impl AvailabilityZone {
    pub fn id(&self) -> &ZoneId {
        &self.az_name_with_provider
    }

    /// Field equality ignoring `record_last_synced`.
    pub fn same_content(&self, other: &AvailabilityZone) -> bool {
        self.az_name_with_provider == other.az_name_with_provider
            && self.provider == other.provider
            && self.region == other.region
            && self.az_name == other.az_name
            && self.az_short_name == other.az_short_name
            && self.az_id == other.az_id
            && self.az_short_name_with_provider == other.az_short_name_with_provider
    }
}

impl fmt::Display for AvailabilityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.az_name_with_provider.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
