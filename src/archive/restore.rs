//! Two-phase backup restore
//!
//! Restore never touches the filesystem before the caller has seen the
//! analysis: phase one reads the manifest and reports whether any
//! destination already exists, phase two copies bytes and overwrites
//! unconditionally. A conflict is a decision point for the caller, not
//! an error.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use super::{ArchiveManifest, PathKind, PathRecord, MANIFEST_NAME};

/// Restore failures that abort before or during a phase. Per-entry
/// write failures are not here; they are logged and counted instead.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("corrupt archive: {reason}")]
    CorruptArchive { reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Zip(#[from] ZipError),
}

/// Result of the analyze phase.
#[derive(Debug, Clone)]
pub struct RestoreAnalysis {
    /// Game name recorded in the manifest.
    pub game: String,
    /// True if any destination already exists on disk.
    pub has_conflict: bool,
    /// Payload entries that would be written by an apply.
    pub eligible: usize,
}

/// Result of the apply phase.
#[derive(Debug, Clone, Copy)]
pub struct RestoreReport {
    /// Entries actually written.
    pub restored: usize,
    /// Entries that failed to write and were skipped.
    pub failed: usize,
}

/// Analyze a backup without mutating anything: parse the manifest,
/// compute every destination, report conflicts and the eligible count.
pub fn analyze_restore(archive_path: &Path) -> Result<RestoreAnalysis, RestoreError> {
    let mut archive = open_archive(archive_path)?;
    let manifest = read_manifest(&mut archive)?;
    let records = index_records(&manifest);

    let mut has_conflict = false;
    let mut eligible = 0usize;

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        let Some(dest) = entry_destination(entry.name(), &records) else {
            continue;
        };
        eligible += 1;
        if dest.exists() {
            debug!("Conflict: {} already exists", dest.display());
            has_conflict = true;
        }
    }

    Ok(RestoreAnalysis {
        game: manifest.game,
        has_conflict,
        eligible,
    })
}

/// Apply a restore, overwriting existing destinations unconditionally.
///
/// The caller is responsible for having confirmed a conflicting restore
/// first (see [`analyze_restore`]). A failure on one entry is logged
/// and skipped; the report counts only entries that truly landed.
pub fn apply_restore(archive_path: &Path) -> Result<RestoreReport, RestoreError> {
    let mut archive = open_archive(archive_path)?;
    let manifest = read_manifest(&mut archive)?;
    let records = index_records(&manifest);

    let mut restored = 0usize;
    let mut failed = 0usize;

    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Unreadable archive entry #{}: {}", i, err);
                failed += 1;
                continue;
            }
        };

        let Some(dest) = entry_destination(entry.name(), &records) else {
            continue;
        };

        match write_destination(&mut entry, &dest) {
            Ok(()) => restored += 1,
            Err(err) => {
                warn!("Failed to restore {}: {}", dest.display(), err);
                failed += 1;
            }
        }
    }

    info!(
        "Restore of '{}' complete: {} written, {} failed",
        manifest.game, restored, failed
    );

    Ok(RestoreReport { restored, failed })
}

fn open_archive(archive_path: &Path) -> Result<ZipArchive<File>, RestoreError> {
    let file = File::open(archive_path)?;
    Ok(ZipArchive::new(file)?)
}

fn read_manifest(archive: &mut ZipArchive<File>) -> Result<ArchiveManifest, RestoreError> {
    let mut raw = String::new();
    match archive.by_name(MANIFEST_NAME) {
        Ok(mut entry) => {
            entry
                .read_to_string(&mut raw)
                .map_err(|err| RestoreError::CorruptArchive {
                    reason: format!("unreadable manifest: {err}"),
                })?;
        }
        Err(ZipError::FileNotFound) => {
            return Err(RestoreError::CorruptArchive {
                reason: "missing manifest entry".to_string(),
            });
        }
        Err(err) => return Err(err.into()),
    }

    let manifest: ArchiveManifest =
        serde_json::from_str(&raw).map_err(|err| RestoreError::CorruptArchive {
            reason: format!("invalid manifest: {err}"),
        })?;

    if manifest.paths.is_empty() {
        return Err(RestoreError::CorruptArchive {
            reason: "manifest lists no save paths".to_string(),
        });
    }

    Ok(manifest)
}

fn index_records(manifest: &ArchiveManifest) -> HashMap<u32, PathRecord> {
    manifest
        .paths
        .iter()
        .map(|record| (record.index, record.clone()))
        .collect()
}

/// Destination for one payload entry, or `None` if the entry is not an
/// eligible payload: the manifest itself, a directory marker, a name
/// without an index prefix, an index with no record, or a relative
/// part that tries to climb out of its base.
fn entry_destination(name: &str, records: &HashMap<u32, PathRecord>) -> Option<PathBuf> {
    if name == MANIFEST_NAME || name.ends_with('/') {
        return None;
    }

    let (index_token, relative) = name.split_once('/')?;
    let index: u32 = index_token.parse().ok()?;
    let record = records.get(&index)?;

    match record.kind {
        PathKind::Dir => {
            if relative.split('/').any(|part| part == "..") {
                warn!("Refusing traversal entry '{}'", name);
                return None;
            }
            Some(PathBuf::from(&record.base).join(relative))
        }
        // A file record restores to its base path; the name component
        // inside the archive is informational only.
        PathKind::File => Some(PathBuf::from(&record.base)),
    }
}

fn write_destination(entry: &mut impl Read, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = File::create(dest)?;
    io::copy(entry, &mut out)?;
    Ok(())
}
