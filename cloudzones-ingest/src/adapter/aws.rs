//! `aws` listing: an object keyed by region name.
//!
//! ```json
//! {
//!   "us-east-1": {
//!     "zones": ["us-east-1a", {"ZoneName": "us-east-1b", "ZoneId": "use1-az2"}]
//!   }
//! }
//! ```
//!
//! Zone entries are bare names or `describe-availability-zones` objects.

use cloudzones_core::types::ProviderCode;
use serde_json::Value;

use super::{name_value, parse_document, zones_array, IntermediateRegion, IntermediateZone, SourceAdapter};
use crate::error::{malformed, IngestError};

pub const PROVIDER: &str = "aws";

#[derive(Debug, Clone, Copy, Default)]
pub struct AwsAdapter;

impl SourceAdapter for AwsAdapter {
    fn provider(&self) -> ProviderCode {
        ProviderCode::from(PROVIDER)
    }

    fn parse(&self, raw: &str) -> Result<Vec<IntermediateRegion>, IngestError> {
        let provider = self.provider();
        let Value::Object(regions) = parse_document(&provider, raw)? else {
            return Err(malformed(&provider, "document", "expected an object keyed by region name"));
        };

        let mut out = Vec::with_capacity(regions.len());
        for (region_name, body) in &regions {
            let record = format!("region '{region_name}'");
            let region_name = name_value(&provider, &record, "region name", Some(&Value::String(region_name.clone())))?;
            let Some(body) = body.as_object() else {
                return Err(malformed(&provider, &record, "region entry is not an object"));
            };
            let zones = zones_array(&provider, &record, body)?
                .iter()
                .enumerate()
                .map(|(i, zone)| parse_zone(&provider, &format!("{record} zone[{i}]"), zone))
                .collect::<Result<Vec<_>, _>>()?;
            out.push(IntermediateRegion { region_name, zones });
        }
        Ok(out)
    }
}

fn parse_zone(provider: &ProviderCode, record: &str, zone: &Value) -> Result<IntermediateZone, IngestError> {
    match zone {
        Value::String(_) => Ok(IntermediateZone {
            az_name: name_value(provider, record, "zone name", Some(zone))?,
            az_id: None,
        }),
        Value::Object(fields) => {
            let az_name = name_value(provider, record, "ZoneName", fields.get("ZoneName"))?;
            let az_id = match fields.get("ZoneId") {
                None | Some(Value::Null) => None,
                some => Some(name_value(provider, record, "ZoneId", some)?),
            };
            Ok(IntermediateZone { az_name, az_id })
        }
        _ => Err(malformed(provider, record, "zone entry must be a name or an object with `ZoneName`")),
    }
}
