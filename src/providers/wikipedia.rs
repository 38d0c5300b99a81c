//! Wikipedia search provider

use super::traits::*;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::ProviderFailure;
use serde_json::Value;

/// Wikipedia search via the MediaWiki API
#[derive(Debug)]
pub struct Wikipedia {
    api_url: String,
    default_lang: String,
}

impl Wikipedia {
    pub fn new() -> Self {
        Self {
            api_url: "https://{lang}.wikipedia.org/w/api.php".to_string(),
            default_lang: "en".to_string(),
        }
    }

    fn get_api_url(&self, lang: &str) -> String {
        let lang = if lang == "all" || lang.is_empty() {
            &self.default_lang
        } else {
            // Extract base language code (e.g., "en" from "en-US")
            lang.split('-').next().unwrap_or(&self.default_lang)
        };
        self.api_url.replace("{lang}", lang)
    }

    fn truncate(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

impl Default for Wikipedia {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for Wikipedia {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Wikipedia
    }

    fn request(&self, query: &str, config: &ProviderConfig) -> Result<ProviderRequest, ProviderFailure> {
        let api_url = match config.endpoint.as_deref() {
            Some(endpoint) => endpoint.to_string(),
            None => self.get_api_url(config.params.get("lang").map_or("", String::as_str)),
        };
        let limit = config.max_results.unwrap_or(10).to_string();

        let request = ProviderRequest::get(api_url)
            .param("action", "query")
            .param("format", "json")
            .param("generator", "search")
            .param("gsrsearch", query)
            .param("gsrlimit", &limit)
            .param("prop", "extracts|info")
            .param("exintro", "1")
            .param("explaintext", "1")
            .param("exlimit", &limit)
            .param("inprop", "url")
            .params(config.params.iter().filter(|(k, _)| k.as_str() != "lang"));

        Ok(request)
    }

    fn parse(
        &self,
        response: &ProviderResponse,
        _config: &ProviderConfig,
    ) -> Result<Vec<ProviderItem>, ProviderFailure> {
        let json: Value = response.json()?;

        // No `query` block means no hits
        let Some(pages) = json
            .get("query")
            .and_then(|q| q.get("pages"))
            .and_then(|p| p.as_object())
        else {
            return Ok(Vec::new());
        };

        // Sort by index to maintain search relevance order
        let mut page_list: Vec<_> = pages.values().collect();
        page_list.sort_by_key(|page| page.get("index").and_then(|i| i.as_i64()).unwrap_or(i64::MAX));

        Ok(page_list
            .into_iter()
            .map(|page| {
                let text = |key: &str| page.get(key).and_then(|v| v.as_str()).map(str::to_string);
                ProviderItem {
                    title: text("title"),
                    url: text("fullurl"),
                    snippet: text("extract").map(|e| Self::truncate(&e, 500)),
                    published: None,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig::new("wikipedia", ProviderKind::Wikipedia)
    }

    #[test]
    fn test_wikipedia_request() {
        let wiki = Wikipedia::new();
        let request = wiki.request("rust programming", &config()).unwrap();

        assert!(request.url.contains("en.wikipedia.org"));
        assert_eq!(
            request.params.get("gsrsearch").map(String::as_str),
            Some("rust programming")
        );
    }

    #[test]
    fn test_language_url() {
        let wiki = Wikipedia::new();
        assert!(wiki.get_api_url("de").contains("de.wikipedia.org"));
        assert!(wiki.get_api_url("en-US").contains("en.wikipedia.org"));
        assert!(wiki.get_api_url("all").contains("en.wikipedia.org"));

        let request = wiki
            .request("rust", &config().with_param("lang", "fr"))
            .unwrap();
        assert!(request.url.contains("fr.wikipedia.org"));
        assert!(!request.params.contains_key("lang"));
    }

    #[test]
    fn test_pages_are_ordered_by_index() {
        let body = r#"{"query": {"pages": {
            "200": {"index": 2, "title": "Rust (fungus)", "fullurl": "https://en.wikipedia.org/wiki/Rust_(fungus)"},
            "100": {"index": 1, "title": "Rust (programming language)",
                    "fullurl": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
                    "extract": "Rust is a language."}
        }}}"#;
        let items = Wikipedia::new()
            .parse(&ProviderResponse::ok(body), &config())
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("Rust (programming language)"));
        assert_eq!(items[0].snippet.as_deref(), Some("Rust is a language."));
        assert_eq!(items[1].title.as_deref(), Some("Rust (fungus)"));
    }

    #[test]
    fn test_no_hits() {
        let items = Wikipedia::new()
            .parse(&ProviderResponse::ok(r#"{"batchcomplete": ""}"#), &config())
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_long_extract_is_truncated() {
        let long = "é".repeat(600);
        let short = Wikipedia::truncate(&long, 500);
        assert_eq!(short.chars().count(), 503);
        assert!(short.ends_with("..."));
    }
}
