//! Hint resolution against the local environment
//!
//! Hints use the Windows path vocabulary (`%APPDATA%`, `~\`, bare
//! `Documents\...`). Resolution is a pure function of hint + an [`Env`]
//! snapshot, so the same hint always produces the same path for a given
//! machine. Existence is checked separately.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

/// Placeholder tokens recognized in hints, in substitution order.
/// Matching is a literal, case-sensitive string replace; a `%AppData%`
/// spelled in mixed case on the wiki passes through unresolved.
const PLACEHOLDERS: &[&str] = &[
    "%USERPROFILE%",
    "%HOMEPATH%",
    "%HOMEDRIVE%",
    "%APPDATA%",
    "%LOCALAPPDATA%",
    "%PROGRAMDATA%",
    "%PUBLIC%",
];

/// Snapshot of the environment a hint resolves against.
///
/// Built from the real machine with [`Env::from_system`], or literally
/// in tests so resolution stays deterministic.
#[derive(Debug, Clone)]
pub struct Env {
    /// User home directory.
    pub home: String,
    /// User Documents folder.
    pub documents: String,
    /// User Saved Games folder.
    pub saved_games: String,
    /// Raw environment variables backing the `%VAR%` placeholders.
    pub vars: HashMap<String, String>,
}

impl Env {
    /// Capture the current user's environment.
    pub fn from_system() -> Self {
        let home = dirs::home_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| "C:\\Users\\Default".to_string());

        let mut vars = HashMap::new();
        for key in ["HOMEPATH", "HOMEDRIVE", "APPDATA", "LOCALAPPDATA", "PROGRAMDATA", "PUBLIC"] {
            if let Ok(value) = std::env::var(key) {
                vars.insert(key.to_string(), value);
            }
        }

        Self {
            documents: join(&home, "Documents"),
            saved_games: join(&home, "Saved Games"),
            home,
            vars,
        }
    }

    /// Value a placeholder token expands to, with documented fallbacks
    /// for machines where the variable is absent.
    fn placeholder_value(&self, token: &str) -> String {
        let var = |key: &str, default: String| -> String {
            self.vars.get(key).cloned().unwrap_or(default)
        };

        match token {
            "%USERPROFILE%" => self.home.clone(),
            "%HOMEPATH%" => var("HOMEPATH", self.home.clone()),
            "%HOMEDRIVE%" => var("HOMEDRIVE", "C:".to_string()),
            "%APPDATA%" => var("APPDATA", join(&self.home, "AppData\\Roaming")),
            "%LOCALAPPDATA%" => var("LOCALAPPDATA", join(&self.home, "AppData\\Local")),
            "%PROGRAMDATA%" => var("PROGRAMDATA", "C:\\ProgramData".to_string()),
            "%PUBLIC%" => var("PUBLIC", "C:\\Users\\Public".to_string()),
            _ => token.to_string(),
        }
    }
}

/// Absolute, backslash-normalized path derived from a hint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolvedPath(String);

impl ResolvedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to a native path for filesystem operations. On Windows the
    /// backslash form is already native; elsewhere separators flip so the
    /// path can be probed on the build machine.
    pub fn to_native(&self) -> PathBuf {
        #[cfg(windows)]
        {
            PathBuf::from(&self.0)
        }
        #[cfg(not(windows))]
        {
            PathBuf::from(self.0.replace('\\', "/"))
        }
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve a raw hint into an absolute path.
///
/// Rules, in order: `~\` prefix, `Documents\`/`Saved Games\` prefixes
/// (case-insensitive), `%VAR%` placeholders, then separator conversion
/// and lexical normalization.
pub fn resolve(hint: &str, env: &Env) -> ResolvedPath {
    let mut path = hint.to_string();

    let tilde_rest = path
        .strip_prefix("~\\")
        .or_else(|| path.strip_prefix("~/"))
        .map(str::to_string);
    if let Some(rest) = tilde_rest {
        path = join(&env.home, &rest);
    }

    let lower = path.to_lowercase();
    if lower.starts_with("documents\\") || lower.starts_with("saved games\\") {
        let rest = path.split_once('\\').map(|(_, rest)| rest.to_string());
        if let Some(rest) = rest {
            let base = if lower.starts_with("documents\\") {
                &env.documents
            } else {
                &env.saved_games
            };
            path = join(base, &rest);
        }
    }

    for token in PLACEHOLDERS {
        if path.contains(token) {
            path = path.replace(token, &env.placeholder_value(token));
        }
    }

    ResolvedPath(normalize(&path.replace('/', "\\")))
}

/// Resolve every hint and keep the ones that exist on disk right now.
///
/// Returns native paths, deduplicated and sorted. Idempotent for an
/// unchanged filesystem.
pub fn enumerate_existing(hints: &[String], env: &Env) -> Vec<PathBuf> {
    let found: BTreeSet<PathBuf> = hints
        .iter()
        .map(|hint| resolve(hint, env).to_native())
        .filter(|path| path.exists())
        .collect();

    found.into_iter().collect()
}

/// Join with a single backslash, tolerating a trailing separator on the base.
fn join(base: &str, rest: &str) -> String {
    format!("{}\\{}", base.trim_end_matches(['\\', '/']), rest)
}

/// Lexical normalization: collapse empty and `.` segments, fold `..`
/// into its parent. Purely textual, the filesystem is never consulted.
fn normalize(path: &str) -> String {
    let rooted = path.starts_with('\\');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('\\') {
        match segment {
            "" | "." => {}
            ".." => {
                // A drive ("C:") or the root cannot be climbed past.
                let at_drive = parts.last().is_some_and(|last| last.ends_with(':'));
                match parts.last() {
                    Some(last) if *last != ".." && !at_drive => {
                        parts.pop();
                    }
                    _ if rooted || at_drive => {}
                    _ => parts.push(".."),
                }
            }
            other => parts.push(other),
        }
    }

    let body = parts.join("\\");
    if rooted {
        format!("\\{body}")
    } else if body.is_empty() {
        ".".to_string()
    } else {
        body
    }
}
