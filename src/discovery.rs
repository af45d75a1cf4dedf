//! Save-path discovery pipeline
//!
//! name -> wiki article -> save-location section -> plain text ->
//! hints -> resolved paths -> existing paths, with a cache
//! short-circuit in front of the network. "Nothing found" is a normal
//! outcome here, not an error; only transport failures bubble up.

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::cache::HintCache;
use crate::hints::{enumerate_existing, extract_path_hints, Env};
use crate::wiki::{find_save_section, html_to_text, WikiLookup};

/// What discovery found for one game.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Resolved paths that exist on this machine right now.
    pub existing: Vec<PathBuf>,
    /// Raw hints as extracted, placeholders intact. Cached for next time
    /// even when nothing exists yet.
    pub hints: Vec<String>,
    /// True when the result came from the cache without a wiki round trip.
    pub from_cache: bool,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.existing.is_empty() && self.hints.is_empty()
    }
}

/// Discover save paths for `name`.
///
/// A cached hint set is only trusted while at least one of its paths
/// still exists; otherwise the wiki is consulted again. Every
/// successful extraction overwrites the cache entry, including ones
/// where no path currently exists (the game may not have run yet).
pub async fn discover_save_paths<W: WikiLookup>(
    wiki: &W,
    cache: &HintCache,
    env: &Env,
    name: &str,
) -> Result<Discovery> {
    if let Some((existing, hints)) = cache.lookup(name, env) {
        info!("Using cached save paths for '{}'", name);
        return Ok(Discovery {
            existing,
            hints,
            from_cache: true,
        });
    }

    info!("Searching PCGamingWiki for '{}'", name);
    let Some(title) = wiki.resolve_title(name).await? else {
        debug!("No wiki article matches '{}'", name);
        return Ok(Discovery::default());
    };
    info!("Matched article: {}", title);

    let sections = wiki.list_sections(&title).await?;
    let Some(section) = find_save_section(&sections) else {
        debug!("'{}' has no save-location section", title);
        return Ok(Discovery::default());
    };

    let html = wiki.section_html(&title, &section.index).await?;
    let hints = extract_path_hints(&html_to_text(&html));
    if hints.is_empty() {
        debug!("No path hints found in '{}' section {}", title, section.index);
        return Ok(Discovery::default());
    }

    let existing = enumerate_existing(&hints, env);
    cache.store_hints(name, &hints);

    info!(
        "Found {} hint(s), {} currently on disk",
        hints.len(),
        existing.len()
    );
    Ok(Discovery {
        existing,
        hints,
        from_cache: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::wiki::WikiSection;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct MockWiki {
        title: Option<String>,
        sections: Vec<WikiSection>,
        html: String,
        requests: AtomicUsize,
    }

    impl MockWiki {
        fn new(title: Option<&str>, sections: &[(&str, &str)], html: &str) -> Self {
            Self {
                title: title.map(str::to_string),
                sections: sections
                    .iter()
                    .map(|(index, line)| WikiSection {
                        index: index.to_string(),
                        line: line.to_string(),
                    })
                    .collect(),
                html: html.to_string(),
                requests: AtomicUsize::new(0),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    impl WikiLookup for MockWiki {
        async fn resolve_title(&self, _name: &str) -> Result<Option<String>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(self.title.clone())
        }

        async fn list_sections(&self, _title: &str) -> Result<Vec<WikiSection>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(self.sections.clone())
        }

        async fn section_html(&self, _title: &str, _index: &str) -> Result<String> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(self.html.clone())
        }
    }

    fn env_for(dir: &TempDir) -> Env {
        let home = dir.path().to_string_lossy().into_owned();
        Env {
            documents: format!("{home}\\Documents"),
            saved_games: format!("{home}\\Saved Games"),
            home,
            vars: HashMap::new(),
        }
    }

    fn fresh_cache() -> HintCache {
        HintCache::new(Arc::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn test_discovery_keeps_raw_hints_and_filters_existing() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        // Only the Documents variant exists on disk.
        std::fs::create_dir_all(dir.path().join("Documents/My Games/GameX")).unwrap();

        let wiki = MockWiki::new(
            Some("GameX"),
            &[("1", "Availability"), ("6", "Save game data location")],
            "<p><code>%APPDATA%\\GameX\\saves</code></p>\n<p><code>Documents\\My Games\\GameX</code></p>",
        );
        let cache = fresh_cache();

        let result = discover_save_paths(&wiki, &cache, &env, "GameX").await.unwrap();

        assert_eq!(result.existing.len(), 1);
        assert!(result.existing[0].ends_with("GameX"));
        assert_eq!(
            result.hints,
            vec![
                "%APPDATA%\\GameX\\saves".to_string(),
                "Documents\\My Games\\GameX".to_string(),
            ]
        );
        assert!(!result.from_cache);

        // Cache holds both raw hints verbatim.
        assert_eq!(cache.hints("gamex").unwrap(), result.hints);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_the_wiki() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        std::fs::create_dir_all(dir.path().join("Saved Games/GameX")).unwrap();

        let cache = fresh_cache();
        cache.store_hints("GameX", &["Saved Games\\GameX".to_string()]);

        let wiki = MockWiki::new(None, &[], "");
        let result = discover_save_paths(&wiki, &cache, &env, "GameX").await.unwrap();

        assert!(result.from_cache);
        assert_eq!(result.existing.len(), 1);
        assert_eq!(wiki.request_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_falls_through_to_discovery() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);

        let cache = fresh_cache();
        // Cached hints whose paths no longer exist anywhere.
        cache.store_hints("GameX", &["Saved Games\\Gone".to_string()]);

        let wiki = MockWiki::new(
            Some("GameX"),
            &[("2", "Save game data location")],
            "<code>Documents\\My Games\\GameX</code>",
        );
        let result = discover_save_paths(&wiki, &cache, &env, "GameX").await.unwrap();

        assert!(!result.from_cache);
        assert!(wiki.request_count() > 0);
        // Extraction succeeded, so the stale entry was replaced.
        assert_eq!(
            cache.hints("GameX").unwrap(),
            vec!["Documents\\My Games\\GameX".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_game_is_empty_not_error() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        let cache = fresh_cache();

        let wiki = MockWiki::new(None, &[], "");
        let result = discover_save_paths(&wiki, &cache, &env, "No Such Game").await.unwrap();

        assert!(result.is_empty());
        assert!(cache.hints("No Such Game").is_none());
    }

    #[tokio::test]
    async fn test_article_without_save_section_is_empty() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        let cache = fresh_cache();

        let wiki = MockWiki::new(Some("GameX"), &[("1", "Availability")], "");
        let result = discover_save_paths(&wiki, &cache, &env, "GameX").await.unwrap();

        assert!(result.is_empty());
        assert!(cache.hints("GameX").is_none());
    }

    #[tokio::test]
    async fn test_hints_cached_even_when_nothing_exists_yet() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        let cache = fresh_cache();

        let wiki = MockWiki::new(
            Some("GameX"),
            &[("2", "Save game data location")],
            "<code>%APPDATA%\\GameX\\saves</code>",
        );
        let result = discover_save_paths(&wiki, &cache, &env, "GameX").await.unwrap();

        // The game has never run here: no live paths, but hints cached.
        assert!(result.existing.is_empty());
        assert_eq!(
            cache.hints("GameX").unwrap(),
            vec!["%APPDATA%\\GameX\\saves".to_string()]
        );
    }
}
