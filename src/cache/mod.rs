//! Persistent hint cache
//!
//! One JSON object on disk maps lower-cased game names to the raw hint
//! lists extracted for them, so repeat lookups skip the wiki round trip.
//! The store sits behind [`CacheStore`] so tests can swap in an
//! in-memory double.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::hints::{enumerate_existing, Env};

/// Cache key reserved for the UI convenience setting, not a game entry.
const LAST_BACKUP_DIR_KEY: &str = "last_backup_dir";

/// Hints stored for one game.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheEntry {
    pub hints: Vec<String>,
}

/// Key/value access to the persisted cache document.
///
/// A degraded store (unreadable file, full disk) degrades to cache
/// misses rather than failing the caller; implementations log and
/// carry on.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn put(&self, key: &str, value: Value);
}

/// The on-disk store: one JSON object, read fully on every access,
/// rewritten on every put. Read-modify-write cycles are serialized by
/// a coarse lock; contention is a single user double-clicking.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Map<String, Value> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!("Cache file {} is not valid JSON: {}", self.path.display(), err);
                Map::new()
            }),
            Err(_) => Map::new(),
        }
    }

    fn save(&self, doc: &Map<String, Value>) {
        let raw = match serde_json::to_string_pretty(doc) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Failed to serialize cache: {}", err);
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, raw) {
            warn!("Failed to write cache {}: {}", self.path.display(), err);
        }
    }
}

impl CacheStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let _guard = self.lock.lock().unwrap();
        self.load().get(key).cloned()
    }

    fn put(&self, key: &str, value: Value) {
        let _guard = self.lock.lock().unwrap();
        let mut doc = self.load();
        doc.insert(key.to_string(), value);
        self.save(&doc);
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    doc: Mutex<Map<String, Value>>,
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.doc.lock().unwrap().get(key).cloned()
    }

    fn put(&self, key: &str, value: Value) {
        self.doc.lock().unwrap().insert(key.to_string(), value);
    }
}

/// Per-game hint cache over an injected store.
#[derive(Clone)]
pub struct HintCache {
    store: Arc<dyn CacheStore>,
}

impl HintCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Open the default on-disk cache at `path`.
    pub fn open(path: &Path) -> Self {
        Self::new(Arc::new(JsonFileStore::new(path)))
    }

    fn key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Raw hints stored for `name`, if any.
    pub fn hints(&self, name: &str) -> Option<Vec<String>> {
        let value = self.store.get(&Self::key(name))?;
        let entry: CacheEntry = serde_json::from_value(value).ok()?;
        if entry.hints.is_empty() {
            None
        } else {
            Some(entry.hints)
        }
    }

    /// Cached hints for `name`, but only if at least one of them still
    /// resolves to an existing path. A stored set whose paths have all
    /// vanished (new machine, uninstalled game) is treated as a miss so
    /// the caller falls through to full discovery.
    pub fn lookup(&self, name: &str, env: &Env) -> Option<(Vec<PathBuf>, Vec<String>)> {
        let hints = self.hints(name)?;
        let existing = enumerate_existing(&hints, env);
        if existing.is_empty() {
            debug!("Cache entry for '{}' has no live paths, treating as miss", name);
            return None;
        }
        Some((existing, hints))
    }

    /// Store the raw hint list for `name`, overwriting any previous
    /// entry. Called on every successful extraction, even when none of
    /// the hints currently exist: the game may simply never have run.
    pub fn store_hints(&self, name: &str, hints: &[String]) {
        let entry = CacheEntry {
            hints: hints.to_vec(),
        };
        match serde_json::to_value(&entry) {
            Ok(value) => self.store.put(&Self::key(name), value),
            Err(err) => warn!("Failed to encode cache entry for '{}': {}", name, err),
        }
    }

    /// Last backup destination the user picked, if remembered.
    pub fn last_backup_dir(&self) -> Option<PathBuf> {
        match self.store.get(LAST_BACKUP_DIR_KEY)? {
            Value::String(dir) => Some(PathBuf::from(dir)),
            _ => None,
        }
    }

    pub fn set_last_backup_dir(&self, dir: &Path) {
        self.store
            .put(LAST_BACKUP_DIR_KEY, Value::String(dir.to_string_lossy().into_owned()));
    }
}
