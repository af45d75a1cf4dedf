//! HTML fragment to plain text
//!
//! Wiki sections come back as rendered HTML. Hint extraction wants the
//! raw text with tags gone and text nodes concatenated in document
//! order, nothing fancier.

use scraper::Html;

/// Strip markup from an HTML fragment, keeping text node content as-is.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags() {
        let text = html_to_text("<p>Saves are in <code>%APPDATA%\\GameX</code> here.</p>");
        assert_eq!(text, "Saves are in %APPDATA%\\GameX here.");
    }

    #[test]
    fn test_keeps_text_across_nested_elements() {
        let html = r#"<div class="infobox"><span>Documents\My Games\X</span>
<ul><li>C:\Games\X\saves</li></ul></div>"#;
        let text = html_to_text(html);
        assert!(text.contains("Documents\\My Games\\X"));
        assert!(text.contains("C:\\Games\\X\\saves"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(html_to_text("no markup here"), "no markup here");
    }
}
