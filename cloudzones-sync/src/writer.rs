//! Hash-gated fixture writer.
//!
//! ## `atomic_write` protocol
//!
//! 1. Normalise line endings to LF.
//! 2. SHA-256 the rendered content and the current on-disk content.
//! 3. Skip if the digests match (the file and its mtime stay untouched).
//! 4. Write to `<path>.cloudzones.tmp`.
//! 5. Rename to the final path (atomic on POSIX).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use cloudzones_core::{store::Store, types::EntityKind};

use crate::error::{io_err, SyncError};
use crate::export::{export, ExportFormat, ExportOptions};

/// Stem shared by every fixture file.
pub const FIXTURE_STEM: &str = "cloud_zones";

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Content changed or the file did not exist.
    Written { path: PathBuf },
    /// Rendered content matches the file on disk.
    Unchanged { path: PathBuf },
    /// `--dry-run`: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path } | WriteResult::Unchanged { path } | WriteResult::WouldWrite { path } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

fn digest(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(content.as_bytes());
    hex::encode(h.finalize())
}

pub(crate) fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

/// Current file content with normalised line endings; empty if absent.
pub(crate) fn read_existing(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(normalize_line_endings(&content))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Atomically write `content` to `path` unless the file already holds it.
pub fn atomic_write(path: &Path, content: &str, dry_run: bool) -> Result<WriteResult, SyncError> {
    let tmp = PathBuf::from(format!("{}.cloudzones.tmp", path.display()));
    atomic_write_with_tmp(path, content, dry_run, &tmp)
}

fn atomic_write_with_tmp(path: &Path, content: &str, dry_run: bool, tmp: &Path) -> Result<WriteResult, SyncError> {
    let normalized = normalize_line_endings(content);
    let content = normalized.as_str();

    if let Some(existing) = read_existing(path)? {
        if digest(&existing) == digest(content) {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Fixture set
// ---------------------------------------------------------------------------

/// One file of the fixture set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureSpec {
    /// `None` is the whole-store file.
    pub entity: Option<EntityKind>,
    pub options: ExportOptions,
}

impl FixtureSpec {
    pub fn file_name(&self, format: ExportFormat) -> String {
        match self.entity {
            None => format!("{FIXTURE_STEM}.{}", format.extension()),
            Some(kind) => format!("{FIXTURE_STEM}-{kind}.{}", format.extension()),
        }
    }
}

/// The four fixture files: whole store, then one per entity type. Only the
/// zone file uses natural references.
pub fn fixture_plan() -> [FixtureSpec; 4] {
    [
        FixtureSpec {
            entity: None,
            options: ExportOptions::default(),
        },
        FixtureSpec {
            entity: Some(EntityKind::Provider),
            options: ExportOptions::default(),
        },
        FixtureSpec {
            entity: Some(EntityKind::Region),
            options: ExportOptions::default(),
        },
        FixtureSpec {
            entity: Some(EntityKind::Zone),
            options: ExportOptions::natural(),
        },
    ]
}

/// Render every fixture file as `(path, content)` pairs.
pub(crate) fn render_fixtures(
    store: &Store,
    dir: &Path,
    format: ExportFormat,
) -> Result<Vec<(PathBuf, String)>, SyncError> {
    fixture_plan()
        .iter()
        .map(|spec| {
            let content = export(store, spec.entity, spec.options, format)?;
            Ok((dir.join(spec.file_name(format)), content))
        })
        .collect()
}

/// `write_fixtures(dir)`: export the fixture set with hash-gated writes.
pub fn write_fixtures(
    store: &Store,
    dir: &Path,
    format: ExportFormat,
    dry_run: bool,
) -> Result<Vec<WriteResult>, SyncError> {
    render_fixtures(store, dir, format)?
        .into_iter()
        .map(|(path, content)| atomic_write(&path, &content, dry_run))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
