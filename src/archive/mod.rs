//! Backup archive format
//!
//! A backup is a plain zip. Payload entries are named
//! `<index>/<relative-or-base-name>` where the index points into the
//! embedded manifest, which records the original absolute base path and
//! whether it was a file or a directory. That is all a restore needs to
//! put bytes back where they came from, on this machine or another one.

pub mod builder;
pub mod restore;

pub use builder::{build_backup, BackupOutcome};
pub use restore::{analyze_restore, apply_restore, RestoreAnalysis, RestoreError, RestoreReport};

use serde::{Deserialize, Serialize};

/// Reserved manifest entry name. Payload names always start with a
/// digit run and a slash, so this can never collide with one.
pub const MANIFEST_NAME: &str = "__savekeeper_paths.json";

/// What kind of source path an archive index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    File,
    Dir,
}

/// One backed-up source path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRecord {
    pub index: u32,
    #[serde(rename = "type")]
    pub kind: PathKind,
    /// Original absolute path, in the convention of the machine that
    /// produced the backup.
    pub base: String,
}

/// The manifest embedded in every backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub game: String,
    pub paths: Vec<PathRecord>,
}

/// Make a game name safe to use as a folder/file stem: anything outside
/// letters, digits, whitespace, `.` and `-` becomes `_`.
pub fn sanitize_game_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '.' || c == '-' || c.is_whitespace() {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = safe.trim();
    if trimmed.is_empty() {
        "Game".to_string()
    } else {
        trimmed.to_string()
    }
}
