//! Bing Web Search v7 provider

use super::json::parse_date_str;
use super::traits::*;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{ConfigError, ProviderFailure};
use serde::Deserialize;

const DEFAULT_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BingResponse {
    #[serde(default)]
    web_pages: Option<WebPages>,
}

#[derive(Debug, Deserialize)]
struct WebPages {
    #[serde(default)]
    value: Vec<WebPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebPage {
    name: Option<String>,
    url: Option<String>,
    snippet: Option<String>,
    date_published: Option<String>,
    date_last_crawled: Option<String>,
}

/// Bing web search
#[derive(Debug, Default)]
pub struct Bing;

impl Bing {
    pub fn new() -> Self {
        Self
    }
}

impl Provider for Bing {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bing
    }

    fn request(&self, query: &str, config: &ProviderConfig) -> Result<ProviderRequest, ProviderFailure> {
        let endpoint = config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let header = config.key_header.as_deref().unwrap_or("Ocp-Apim-Subscription-Key");

        let mut request = ProviderRequest::get(endpoint)
            .param("q", query)
            .param("responseFilter", "Webpages")
            .header(header, config.api_key.clone().unwrap_or_default())
            .params(&config.params);
        if let Some(count) = config.max_results {
            request = request.param("count", count.min(50).to_string());
        }

        Ok(request)
    }

    fn parse(
        &self,
        response: &ProviderResponse,
        _config: &ProviderConfig,
    ) -> Result<Vec<ProviderItem>, ProviderFailure> {
        let body: BingResponse = response.json()?;
        let pages = body.web_pages.map(|w| w.value).unwrap_or_default();

        Ok(pages
            .into_iter()
            .map(|page| {
                let published = page
                    .date_published
                    .as_deref()
                    .or(page.date_last_crawled.as_deref())
                    .and_then(parse_date_str);
                ProviderItem {
                    title: page.name,
                    url: page.url,
                    snippet: page.snippet,
                    published,
                }
            })
            .collect())
    }

    fn validate(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
        require_api_key(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn config() -> ProviderConfig {
        ProviderConfig::new("bing", ProviderKind::Bing).with_api_key("key")
    }

    #[test]
    fn test_bing_request() {
        let request = Bing::new().request("rust", &config()).unwrap();
        assert!(request.url.contains("api.bing.microsoft.com"));
        assert!(request.params.contains_key("q"));
        assert_eq!(
            request.headers.get("Ocp-Apim-Subscription-Key").map(String::as_str),
            Some("key")
        );
    }

    #[test]
    fn test_bing_parse() {
        let body = r#"{
            "_type": "SearchResponse",
            "webPages": {"value": [
                {"name": "Rust", "url": "https://www.rust-lang.org/", "snippet": "Fast",
                 "dateLastCrawled": "2024-03-01T12:00:00.0000000Z"},
                {"name": "Book", "url": "https://doc.rust-lang.org/book/",
                 "datePublished": "2023-12-24T00:00:00.0000000",
                 "dateLastCrawled": "2024-03-01T12:00:00.0000000Z"}
            ]}
        }"#;
        let items = Bing::new()
            .parse(&ProviderResponse::ok(body), &config())
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("Rust"));
        let crawled = items[0].published.unwrap();
        assert_eq!((crawled.month(), crawled.hour()), (3, 12));
        // datePublished wins over dateLastCrawled
        assert_eq!(items[1].published.unwrap().year(), 2023);
    }

    #[test]
    fn test_bing_without_web_pages() {
        let items = Bing::new()
            .parse(&ProviderResponse::ok(r#"{"_type": "SearchResponse"}"#), &config())
            .unwrap();
        assert!(items.is_empty());
    }
}
