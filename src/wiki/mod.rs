//! PCGamingWiki lookup client
//!
//! Thin consumer of the MediaWiki API: resolve a free-form game name to
//! an article title, find the "Save game data location" section, and
//! fetch that section's rendered HTML. Network failures fail closed as
//! "not found" at the discovery layer; nothing here retries.

mod text;

pub use text::html_to_text;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const PCGW_API: &str = "https://www.pcgamingwiki.com/w/api.php";

/// Short timeout: a slow wiki should not hang discovery for long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Section heading the save locations live under.
const SAVE_SECTION_HEADING: &str = "save game data location";

/// One section of a wiki article, as listed by the parse API.
#[derive(Debug, Clone, Deserialize)]
pub struct WikiSection {
    /// Section index token. The API hands back strings ("6", "T-2"),
    /// not numbers; it goes back out verbatim in the section fetch.
    pub index: String,
    /// Section heading text.
    pub line: String,
}

/// The three wiki operations discovery consumes, as a seam for tests.
#[allow(async_fn_in_trait)]
pub trait WikiLookup {
    /// Resolve a free-form name to an article title, if any matches.
    async fn resolve_title(&self, name: &str) -> Result<Option<String>>;

    /// List the sections of an article in order.
    async fn list_sections(&self, title: &str) -> Result<Vec<WikiSection>>;

    /// Rendered HTML of one section.
    async fn section_html(&self, title: &str, index: &str) -> Result<String>;
}

/// Pick the save-location section: exact heading match first, then a
/// substring match for articles with decorated headings.
pub fn find_save_section(sections: &[WikiSection]) -> Option<&WikiSection> {
    sections
        .iter()
        .find(|s| s.line.trim().eq_ignore_ascii_case(SAVE_SECTION_HEADING))
        .or_else(|| {
            sections
                .iter()
                .find(|s| s.line.trim().to_lowercase().contains(SAVE_SECTION_HEADING))
        })
}

/// PCGamingWiki API client.
pub struct PcgwClient {
    client: reqwest::Client,
    api_base: String,
}

impl PcgwClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("savekeeper/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base: PCGW_API.to_string(),
        })
    }

    /// Point the client at a different API endpoint (test servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn api_get(&self, params: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .client
            .get(&self.api_base)
            .query(params)
            .query(&[("format", "json")])
            .send()
            .await
            .context("PCGamingWiki request failed")?;

        response
            .error_for_status()
            .context("PCGamingWiki returned an error status")?
            .json()
            .await
            .context("PCGamingWiki response was not valid JSON")
    }

    /// Title suggestions for a partial query, best match first.
    pub async fn search_titles(&self, query: &str, limit: u32) -> Result<Vec<String>> {
        let limit = limit.to_string();
        let data = self
            .api_get(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ])
            .await?;

        Ok(parse_search_titles(&data))
    }
}

impl WikiLookup for PcgwClient {
    async fn resolve_title(&self, name: &str) -> Result<Option<String>> {
        let data = self
            .api_get(&[
                ("action", "opensearch"),
                ("search", name),
                ("limit", "1"),
                ("namespace", "0"),
            ])
            .await?;

        let title = parse_opensearch_title(&data);
        debug!("opensearch '{}' -> {:?}", name, title);
        Ok(title)
    }

    async fn list_sections(&self, title: &str) -> Result<Vec<WikiSection>> {
        let data = self
            .api_get(&[("action", "parse"), ("page", title), ("prop", "sections")])
            .await?;

        let sections = data
            .pointer("/parse/sections")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .context("Unexpected section list shape from PCGamingWiki")?
            .unwrap_or_default();

        Ok(sections)
    }

    async fn section_html(&self, title: &str, index: &str) -> Result<String> {
        let data = self
            .api_get(&[
                ("action", "parse"),
                ("page", title),
                ("prop", "text"),
                ("section", index),
            ])
            .await?;

        Ok(data
            .pointer("/parse/text/*")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

/// First title of an opensearch reply: `["query", ["Title", ...], ...]`.
fn parse_opensearch_title(data: &Value) -> Option<String> {
    data.get(1)?.get(0)?.as_str().map(str::to_string)
}

fn parse_search_titles(data: &Value) -> Vec<String> {
    data.pointer("/query/search")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|r| r.get("title").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
