//! `gcp` listing: the array printed by
//! `gcloud compute regions list --format=json`.
//!
//! Only `name` and `zones` are read. Zones are resource URLs whose last path
//! segment is the zone name; bare names are accepted too. GCP has no zone id.

use cloudzones_core::types::ProviderCode;
use serde_json::Value;

use super::{name_value, parse_document, zones_array, IntermediateRegion, IntermediateZone, SourceAdapter};
use crate::error::{malformed, IngestError};

pub const PROVIDER: &str = "gcp";

#[derive(Debug, Clone, Copy, Default)]
pub struct GcpAdapter;

impl SourceAdapter for GcpAdapter {
    fn provider(&self) -> ProviderCode {
        ProviderCode::from(PROVIDER)
    }

    fn parse(&self, raw: &str) -> Result<Vec<IntermediateRegion>, IngestError> {
        let provider = self.provider();
        let Value::Array(entries) = parse_document(&provider, raw)? else {
            return Err(malformed(&provider, "document", "expected an array of region resources"));
        };

        let mut out = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let Some(body) = entry.as_object() else {
                return Err(malformed(&provider, format!("region[{i}]"), "region entry is not an object"));
            };
            let region_name = name_value(&provider, &format!("region[{i}]"), "name", body.get("name"))?;
            let record = format!("region '{region_name}'");
            let zones = zones_array(&provider, &record, body)?
                .iter()
                .enumerate()
                .map(|(j, zone)| {
                    let record = format!("{record} zone[{j}]");
                    let url = name_value(&provider, &record, "zone", Some(zone))?;
                    zone_from_url(&provider, &record, &url)
                })
                .collect::<Result<Vec<_>, _>>()?;
            out.push(IntermediateRegion { region_name, zones });
        }
        Ok(out)
    }
}

fn zone_from_url(provider: &ProviderCode, record: &str, url: &str) -> Result<IntermediateZone, IngestError> {
    let name = url.rsplit('/').next().unwrap_or_default();
    if name.is_empty() {
        return Err(malformed(provider, record, format!("zone URL has no trailing name: '{url}'")));
    }
    Ok(IntermediateZone {
        az_name: name.to_string(),
        az_id: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GCLOUD: &str = r#"[
      {
        "creationTimestamp": "1969-12-31T16:00:00.000-08:00",
        "name": "us-central1",
        "status": "UP",
        "zones": [
          "https://www.googleapis.com/compute/v1/projects/demo/zones/us-central1-a",
          "https://www.googleapis.com/compute/v1/projects/demo/zones/us-central1-b"
        ]
      },
      {"name": "europe-west4", "zones": ["europe-west4-a"]}
    ]"#;

    #[test]
    fn parses_gcloud_region_list() {
        let regions = GcpAdapter.parse(GCLOUD).expect("parse");
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].region_name, "us-central1");
        let names: Vec<_> = regions[0].zones.iter().map(|z| z.az_name.as_str()).collect();
        assert_eq!(names, ["us-central1-a", "us-central1-b"]);
        assert!(regions[0].zones.iter().all(|z| z.az_id.is_none()));
        assert_eq!(regions[1].zones[0].az_name, "europe-west4-a");
    }

    #[test]
    fn missing_zones_is_malformed() {
        let err = GcpAdapter.parse(r#"[{"name": "us-central1"}]"#).unwrap_err();
        assert_eq!(err.to_string(), "malformed gcp input at region 'us-central1': missing `zones`");
    }

    #[test]
    fn trailing_slash_url_is_malformed() {
        let err = GcpAdapter
            .parse(r#"[{"name": "us-central1", "zones": ["https://x/zones/"]}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("no trailing name"), "got: {err}");
    }

    #[test]
    fn missing_name_reports_index() {
        let err = GcpAdapter.parse(r#"[{"zones": []}]"#).unwrap_err();
        assert!(err.to_string().contains("region[0]"), "got: {err}");
    }
}
