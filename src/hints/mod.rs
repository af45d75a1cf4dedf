//! Heuristic extraction of save-path hints from wiki prose
//!
//! PCGamingWiki articles describe save locations in loosely structured
//! text ("saves are under %APPDATA%\Studio\Game"). This module pulls
//! every plausible Windows-style path candidate out of such text.

mod resolve;

pub use resolve::{enumerate_existing, resolve, Env, ResolvedPath};

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Characters stripped from the end of a raw match. Wiki prose tends to
/// run paths straight into punctuation ("...\Saves.", "(%APPDATA%\X)").
const TRAILING_JUNK: &[char] = &['.', ' ', ';', ':', '"', '\'', ')', '('];

/// One combined alternation over every path shape seen on the wiki:
/// drive-absolute, %VAR%-prefixed, home-relative, bare profile-relative.
static HINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let arms = [
        r#"[A-Za-z]:\\[^\n\r<>|?*"]+"#,
        r#"%[A-Za-z_]+%\\[^\n\r<>|?*"]+"#,
        r#"~\\[^\n\r<>|?*"]+"#,
        r#"\\Users\\[^\\\n\r]+\\[^\n\r<>|?*"]+"#,
        r#"Documents\\[^\n\r<>|?*"]+"#,
        r#"Saved Games\\[^\n\r<>|?*"]+"#,
        r#"AppData\\Roaming\\[^\n\r<>|?*"]+"#,
        r#"AppData\\Local\\[^\n\r<>|?*"]+"#,
        r#"OneDrive\\Documents\\[^\n\r<>|?*"]+"#,
    ];
    Regex::new(&format!("({})", arms.join(")|("))).expect("hint pattern must compile")
});

/// Extract candidate save-path hints from plain text.
///
/// Best-effort: the patterns are deliberately loose, and misses or
/// extra candidates are expected. Guarantees that every returned hint
/// has at least two backslash-separated segments, and that the result
/// is deduplicated and lexicographically sorted so repeated runs over
/// the same text are byte-identical (the cache depends on this).
pub fn extract_path_hints(text: &str) -> Vec<String> {
    let mut hints = BTreeSet::new();

    for m in HINT_PATTERN.find_iter(text) {
        let candidate = m.as_str().trim().trim_end_matches(TRAILING_JUNK);

        // A lone keyword ("Documents", "C:") is not a usable path.
        if candidate.split('\\').count() < 2 {
            continue;
        }

        hints.insert(candidate.to_string());
    }

    hints.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_common_shapes() {
        let text = "Saves: %APPDATA%\\Studio\\GameX\\saves\n\
                    Install: C:\\Games\\GameX\\profile\n\
                    Config: Documents\\My Games\\GameX\n\
                    Also: ~\\AppData\\LocalLow\\Studio\\GameX\n";

        let hints = extract_path_hints(text);
        assert!(hints.contains(&"%APPDATA%\\Studio\\GameX\\saves".to_string()));
        assert!(hints.contains(&"C:\\Games\\GameX\\profile".to_string()));
        assert!(hints.contains(&"Documents\\My Games\\GameX".to_string()));
        assert!(hints.contains(&"~\\AppData\\LocalLow\\Studio\\GameX".to_string()));
    }

    #[test]
    fn test_trailing_punctuation_stripped() {
        let hints = extract_path_hints("Check %LOCALAPPDATA%\\GameX\\saves.");
        assert_eq!(hints, vec!["%LOCALAPPDATA%\\GameX\\saves".to_string()]);

        let hints = extract_path_hints("(see Saved Games\\GameX\\slots)");
        assert_eq!(hints, vec!["Saved Games\\GameX\\slots".to_string()]);
    }

    #[test]
    fn test_every_hint_has_two_segments() {
        let text = "Path soup: C:\\x AppData\\Roaming\\y Documents\\z \
                    %APPDATA%\\. ~\\; bare Documents mention, C:\\Games\\X.";
        for hint in extract_path_hints(text) {
            assert!(hint.split('\\').count() >= 2, "bad hint: {hint}");
        }

        // A keyword with no sub-path is never a hint.
        assert!(extract_path_hints("kept in your Documents folder").is_empty());
    }

    #[test]
    fn test_deterministic_order_and_dedup() {
        let text = "Documents\\My Games\\X\n%APPDATA%\\X\\saves\nDocuments\\My Games\\X\n";
        let first = extract_path_hints(text);
        let second = extract_path_hints(text);
        assert_eq!(first, second);

        let mut sorted = first.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(first, sorted);
    }

    #[test]
    fn test_users_profile_paths() {
        let hints = extract_path_hints("Old guides say \\Users\\YourName\\Saved Games\\GameX");
        assert_eq!(hints, vec!["\\Users\\YourName\\Saved Games\\GameX".to_string()]);
    }

    #[test]
    fn test_match_stops_at_forbidden_chars() {
        let hints = extract_path_hints("See <code>C:\\Games\\X\\saves</code> for details");
        assert_eq!(hints, vec!["C:\\Games\\X\\saves".to_string()]);
    }
}
