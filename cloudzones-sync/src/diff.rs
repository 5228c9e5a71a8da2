//! Unified diff of what `write_fixtures` would change, for `cloudzones diff`.

use std::path::{Path, PathBuf};

use similar::TextDiff;

use cloudzones_core::store::Store;

use crate::{
    export::ExportFormat,
    writer::{normalize_line_endings, read_existing, render_fixtures},
    SyncError,
};

/// A single fixture file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Render the fixture set and compare it to the files in `dir`.
///
/// No files are written. Files whose content already matches are omitted;
/// a missing file diffs against empty content.
pub fn diff_fixtures(store: &Store, dir: &Path, format: ExportFormat) -> Result<Vec<FixtureDiff>, SyncError> {
    let mut diffs = Vec::new();
    for (path, rendered) in render_fixtures(store, dir, format)? {
        let rendered = normalize_line_endings(&rendered);
        let existing = read_existing(&path)?.unwrap_or_default();
        if existing == rendered {
            continue;
        }

        let relative = path.strip_prefix(dir).unwrap_or(path.as_path());
        let old_header = format!("a/{}", relative.display());
        let new_header = format!("b/{}", relative.display());
        let unified = TextDiff::from_lines(&existing, &rendered)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();

        diffs.push(FixtureDiff {
            path,
            unified_diff: unified,
        });
    }
    Ok(diffs)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use cloudzones_core::types::ProviderCode;
    use tempfile::TempDir;

    use crate::{pipeline::Pipeline, writer::write_fixtures};

    use super::*;

    const AWS: &str = r#"{"us-east-1": {"zones": ["us-east-1a", "us-east-1b"]}}"#;

    fn synced(raw: &str, stamp: &str) -> Store {
        let mut store = Store::in_memory();
        Pipeline::default()
            .sync_provider(&mut store, &ProviderCode::from("aws"), raw, stamp, false)
            .expect("sync");
        store
    }

    #[test]
    fn no_diffs_after_writing_fixtures() {
        let dir = TempDir::new().expect("dir");
        let store = synced(AWS, "2024-05-01T00:00:00Z");
        write_fixtures(&store, dir.path(), ExportFormat::Json, false).expect("write");

        let diffs = diff_fixtures(&store, dir.path(), ExportFormat::Json).expect("diff");
        assert!(diffs.is_empty(), "freshly written fixtures should have no diff");
    }

    #[test]
    fn missing_files_diff_against_empty() {
        let dir = TempDir::new().expect("dir");
        let diffs = diff_fixtures(&synced(AWS, "t"), dir.path(), ExportFormat::Json).expect("diff");
        assert_eq!(diffs.len(), 4);
        assert!(!dir.path().join("cloud_zones.json").exists(), "diff must not write");
    }

    #[test]
    fn changed_store_produces_unified_diff() {
        let dir = TempDir::new().expect("dir");
        write_fixtures(&synced(AWS, "t"), dir.path(), ExportFormat::Json, false).expect("write");

        let grown = synced(r#"{"us-east-1": {"zones": ["us-east-1a", "us-east-1b", "us-east-1c"]}}"#, "t");
        let diffs = diff_fixtures(&grown, dir.path(), ExportFormat::Json).expect("diff");

        let zone_diff = diffs
            .iter()
            .find(|d| d.path.ends_with("cloud_zones-zone.json"))
            .expect("zone diff");
        assert!(zone_diff.unified_diff.contains("--- a/cloud_zones-zone.json"));
        assert!(zone_diff.unified_diff.contains("+++ b/cloud_zones-zone.json"));
        assert!(zone_diff.unified_diff.contains("+        \"az_name\": \"us-east-1c\""));
        assert!(
            !diffs.iter().any(|d| d.path.ends_with("cloud_zones-provider.json")),
            "provider file did not change"
        );
    }

    #[test]
    fn crlf_checkout_is_not_a_diff() {
        let dir = TempDir::new().expect("dir");
        let store = synced(AWS, "t");
        write_fixtures(&store, dir.path(), ExportFormat::Json, false).expect("write");
        let path = dir.path().join("cloud_zones-provider.json");
        let crlf = fs::read_to_string(&path).unwrap().replace('\n', "\r\n");
        fs::write(&path, crlf).unwrap();

        let diffs = diff_fixtures(&store, dir.path(), ExportFormat::Json).expect("diff");
        assert!(diffs.is_empty());
    }
}
