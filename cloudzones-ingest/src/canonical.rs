//! Canonicalizer: intermediate records → store records.
//!
//! Identifiers are composed by [`RegionId::compose`] / [`ZoneId::compose`];
//! short names come from a [`NamingRule`] looked up by provider code. A name
//! the rule cannot abbreviate is an error, never a guess.

use std::collections::{BTreeMap, BTreeSet};

use cloudzones_core::store::LiveSet;
use cloudzones_core::types::{with_provider, AvailabilityZone, ProviderCode, Region, RegionId, ZoneId};

use crate::adapter::IntermediateRegion;
use crate::error::IngestError;

// ---------------------------------------------------------------------------
// Naming rules
// ---------------------------------------------------------------------------

/// Provider-specific short-name derivation.
pub trait NamingRule: Send + Sync {
    fn provider(&self) -> ProviderCode;

    /// `us-east-1` → `use1`. `None` when the name does not follow the
    /// provider's scheme.
    fn region_short_name(&self, region_name: &str) -> Option<String>;

    /// `us-east-1a` → `use1a`, given the already derived region short name.
    fn zone_short_name(&self, region_name: &str, region_short_name: &str, az_name: &str) -> Option<String>;
}

fn direction(word: &str) -> Option<&'static str> {
    Some(match word {
        "north" => "n",
        "south" => "s",
        "east" => "e",
        "west" => "w",
        "central" => "c",
        "northeast" => "ne",
        "northwest" => "nw",
        "southeast" => "se",
        "southwest" => "sw",
        _ => return None,
    })
}

fn is_lower_alpha(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_lowercase())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `us-gov-west-1` → `usgw1`: geography prefix, abbreviated middle words,
/// numeric suffix. Zones append their suffix (`a`, or `-bos-1a` for local
/// zones) to the region short name.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsNaming;

impl AwsNaming {
    fn word(word: &str) -> Option<&'static str> {
        match word {
            "gov" => Some("g"),
            "iso" => Some("i"),
            "isob" => Some("ib"),
            other => direction(other),
        }
    }
}

impl NamingRule for AwsNaming {
    fn provider(&self) -> ProviderCode {
        ProviderCode::from(crate::adapter::aws::PROVIDER)
    }

    fn region_short_name(&self, region_name: &str) -> Option<String> {
        let parts: Vec<&str> = region_name.split('-').collect();
        let [geo, middle @ .., number] = parts.as_slice() else {
            return None;
        };
        if middle.is_empty() || !is_lower_alpha(geo) || !is_digits(number) {
            return None;
        }
        let mut short = geo.to_string();
        for word in middle {
            short.push_str(Self::word(word)?);
        }
        short.push_str(number);
        Some(short)
    }

    fn zone_short_name(&self, region_name: &str, region_short_name: &str, az_name: &str) -> Option<String> {
        let suffix = az_name.strip_prefix(region_name)?;
        let local = suffix
            .strip_prefix('-')
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'));
        if is_lower_alpha(suffix) || local {
            Some(format!("{region_short_name}{suffix}"))
        } else {
            None
        }
    }
}

/// `northamerica-northeast1` → `nane1`: continent code, abbreviated
/// direction, region number. Zones `us-central1-a` → `usc1a`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GcpNaming;

impl GcpNaming {
    fn continent(word: &str) -> Option<&'static str> {
        Some(match word {
            "us" => "us",
            "europe" => "eu",
            "asia" => "as",
            "australia" => "au",
            "northamerica" => "na",
            "southamerica" => "sa",
            "me" => "me",
            "africa" => "af",
            _ => return None,
        })
    }
}

impl NamingRule for GcpNaming {
    fn provider(&self) -> ProviderCode {
        ProviderCode::from(crate::adapter::gcp::PROVIDER)
    }

    fn region_short_name(&self, region_name: &str) -> Option<String> {
        let (continent, rest) = region_name.split_once('-')?;
        let word = rest.trim_end_matches(|c: char| c.is_ascii_digit());
        let number = &rest[word.len()..];
        if !is_digits(number) {
            return None;
        }
        Some(format!("{}{}{number}", Self::continent(continent)?, direction(word)?))
    }

    fn zone_short_name(&self, region_name: &str, region_short_name: &str, az_name: &str) -> Option<String> {
        let letter = az_name.strip_prefix(region_name)?.strip_prefix('-')?;
        is_lower_alpha(letter).then(|| format!("{region_short_name}{letter}"))
    }
}

// ---------------------------------------------------------------------------
// Canonicalizer
// ---------------------------------------------------------------------------

/// A canonical region with its zones, both identifier ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRegion {
    pub region: Region,
    pub zones: Vec<AvailabilityZone>,
}

/// Provider code → naming rule.
pub struct Canonicalizer {
    rules: BTreeMap<ProviderCode, Box<dyn NamingRule>>,
}

impl Canonicalizer {
    pub fn empty() -> Self {
        Self { rules: BTreeMap::new() }
    }

    pub fn builtin() -> Self {
        let mut canonicalizer = Self::empty();
        canonicalizer.register(Box::new(AwsNaming));
        canonicalizer.register(Box::new(GcpNaming));
        canonicalizer
    }

    pub fn register(&mut self, rule: Box<dyn NamingRule>) {
        self.rules.insert(rule.provider(), rule);
    }

    pub fn rule(&self, provider: &ProviderCode) -> Result<&dyn NamingRule, IngestError> {
        self.rules
            .get(provider)
            .map(|r| &**r)
            .ok_or_else(|| IngestError::UnknownProvider(provider.clone()))
    }

    /// Derive canonical records for one provider's batch.
    ///
    /// Every record gets the same `synced_at`. Fails on the first name the
    /// provider's rule cannot abbreviate or on an identifier that appears
    /// twice in the batch.
    pub fn canonicalize(
        &self,
        provider: &ProviderCode,
        regions: &[IntermediateRegion],
        synced_at: &str,
    ) -> Result<Vec<CanonicalRegion>, IngestError> {
        let rule = self.rule(provider)?;
        let unrecognized = |name: &str| IngestError::UnrecognizedName {
            provider: provider.clone(),
            name: name.to_string(),
        };
        let duplicate = |id: &str| IngestError::DuplicateIdentifier {
            provider: provider.clone(),
            id: id.to_string(),
        };

        let mut seen_regions = BTreeSet::new();
        let mut seen_zones = BTreeSet::new();
        let mut out = Vec::with_capacity(regions.len());

        for raw in regions {
            let region_id = RegionId::compose(provider, &raw.region_name);
            if !seen_regions.insert(region_id.clone()) {
                return Err(duplicate(&region_id.0));
            }
            let region_short = rule
                .region_short_name(&raw.region_name)
                .ok_or_else(|| unrecognized(&raw.region_name))?;

            let mut zones = Vec::with_capacity(raw.zones.len());
            for z in &raw.zones {
                let zone_id = ZoneId::compose(provider, &z.az_name);
                if !seen_zones.insert(zone_id.clone()) {
                    return Err(duplicate(&zone_id.0));
                }
                let az_short = rule
                    .zone_short_name(&raw.region_name, &region_short, &z.az_name)
                    .ok_or_else(|| unrecognized(&z.az_name))?;
                zones.push(AvailabilityZone {
                    az_name_with_provider: zone_id,
                    provider: provider.clone(),
                    region: region_id.clone(),
                    record_last_synced: synced_at.to_string(),
                    az_name: z.az_name.clone(),
                    az_short_name_with_provider: with_provider(provider, &az_short),
                    az_short_name: az_short,
                    az_id: z.az_id.clone(),
                });
            }
            zones.sort_by(|a, b| a.az_name_with_provider.cmp(&b.az_name_with_provider));

            out.push(CanonicalRegion {
                region: Region {
                    region_name_with_provider: region_id,
                    provider: provider.clone(),
                    record_last_synced: synced_at.to_string(),
                    region_name: raw.region_name.clone(),
                    region_short_name_with_provider: with_provider(provider, &region_short),
                    region_short_name: region_short,
                },
                zones,
            });
        }

        out.sort_by(|a, b| a.region.region_name_with_provider.cmp(&b.region.region_name_with_provider));
        Ok(out)
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Identifiers of a canonical batch; the input to a prune.
pub fn live_set(batch: &[CanonicalRegion]) -> LiveSet {
    LiveSet {
        regions: batch.iter().map(|c| c.region.region_name_with_provider.clone()).collect(),
        zones: batch
            .iter()
            .flat_map(|c| c.zones.iter().map(|z| z.az_name_with_provider.clone()))
            .collect(),
    }
}
