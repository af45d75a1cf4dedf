//! Backup creation
//!
//! Packs an ordered list of existing save paths into one zip with the
//! index manifest as its last entry. Individual unreadable files are
//! skipped with a warning; one locked file must never sink the backup.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{sanitize_game_name, ArchiveManifest, PathKind, PathRecord, MANIFEST_NAME};

/// What a backup run produced.
#[derive(Debug)]
pub struct BackupOutcome {
    /// Absolute path of the archive written.
    pub archive_path: PathBuf,
    /// Payload entries written.
    pub files_written: usize,
    /// Source files skipped because they could not be read or stored.
    pub files_skipped: usize,
}

/// Build a backup archive for `paths` under `dest_root/<safe name>/`.
///
/// `paths` is expected to be ordered and deduplicated; record indices
/// follow its order 0..N-1.
pub fn build_backup(game_name: &str, paths: &[PathBuf], dest_root: &Path) -> Result<BackupOutcome> {
    let safe_name = sanitize_game_name(game_name);
    let out_dir = dest_root.join(&safe_name);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create backup folder {}", out_dir.display()))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let archive_path = out_dir.join(format!("{safe_name}_{timestamp}.zip"));

    info!("Creating backup: {}", archive_path.display());

    let file = File::create(&archive_path)
        .with_context(|| format!("Failed to create {}", archive_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut records = Vec::with_capacity(paths.len());
    let mut files_written = 0usize;
    let mut files_skipped = 0usize;

    for (idx, base) in paths.iter().enumerate() {
        let index = idx as u32;

        if base.is_dir() {
            records.push(PathRecord {
                index,
                kind: PathKind::Dir,
                base: base.to_string_lossy().into_owned(),
            });

            for entry in WalkDir::new(base).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel = match entry.path().strip_prefix(base) {
                    Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                    Err(_) => continue,
                };
                let arcname = format!("{index}/{rel}");
                match write_entry(&mut zip, entry.path(), &arcname, options) {
                    Ok(()) => files_written += 1,
                    Err(err) => {
                        warn!("Skipped {}: {:#}", entry.path().display(), err);
                        files_skipped += 1;
                    }
                }
            }
        } else {
            records.push(PathRecord {
                index,
                kind: PathKind::File,
                base: base.to_string_lossy().into_owned(),
            });

            let name = base
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("entry_{index}"));
            let arcname = format!("{index}/{name}");
            match write_entry(&mut zip, base, &arcname, options) {
                Ok(()) => files_written += 1,
                Err(err) => {
                    warn!("Skipped {}: {:#}", base.display(), err);
                    files_skipped += 1;
                }
            }
        }
    }

    let manifest = ArchiveManifest {
        game: game_name.to_string(),
        paths: records,
    };
    zip.start_file(MANIFEST_NAME, options)
        .context("Failed to start manifest entry")?;
    serde_json::to_writer_pretty(&mut zip, &manifest).context("Failed to write manifest")?;

    zip.finish().context("Failed to finalize backup archive")?;

    info!(
        "Backup complete: {} files written, {} skipped",
        files_written, files_skipped
    );

    let archive_path = archive_path.canonicalize().unwrap_or(archive_path);
    Ok(BackupOutcome {
        archive_path,
        files_written,
        files_skipped,
    })
}

fn write_entry(
    zip: &mut ZipWriter<File>,
    source: &Path,
    arcname: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    let mut reader = File::open(source)?;
    zip.start_file(arcname, options)?;
    io::copy(&mut reader, zip)?;
    Ok(())
}
