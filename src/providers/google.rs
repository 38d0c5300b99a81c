//! Google Custom Search JSON API provider

use super::traits::*;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{ConfigError, ProviderFailure};
use serde::Deserialize;

const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

/// Google Programmable Search
#[derive(Debug, Default)]
pub struct Google;

impl Google {
    pub fn new() -> Self {
        Self
    }
}

impl Provider for Google {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn request(&self, query: &str, config: &ProviderConfig) -> Result<ProviderRequest, ProviderFailure> {
        let endpoint = config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);

        // cx comes in with the configured params
        let mut request = ProviderRequest::get(endpoint)
            .param("q", query)
            .params(&config.params);
        match config.key_header.as_deref() {
            Some(header) => request = request.header(header, config.api_key.clone().unwrap_or_default()),
            None => request = request.param("key", config.api_key.clone().unwrap_or_default()),
        }
        if let Some(num) = config.max_results {
            request = request.param("num", num.clamp(1, 10).to_string());
        }

        Ok(request)
    }

    fn parse(
        &self,
        response: &ProviderResponse,
        _config: &ProviderConfig,
    ) -> Result<Vec<ProviderItem>, ProviderFailure> {
        // No `items` means no results
        let body: CseResponse = response.json()?;

        Ok(body
            .items
            .into_iter()
            .map(|item| ProviderItem {
                title: item.title,
                url: item.link,
                snippet: item.snippet,
                published: None,
            })
            .collect())
    }

    fn validate(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
        require_api_key(config)?;
        if !config.params.contains_key("cx") {
            return Err(ConfigError::provider(&config.name, "google needs a `cx` param"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig::new("google", ProviderKind::Google)
            .with_api_key("key")
            .with_param("cx", "engine")
    }

    #[test]
    fn test_google_request() {
        let request = Google::new().request("rust", &config()).unwrap();

        assert!(request.url.contains("googleapis.com"));
        assert_eq!(request.params.get("q").map(String::as_str), Some("rust"));
        assert_eq!(request.params.get("cx").map(String::as_str), Some("engine"));
        assert_eq!(request.params.get("key").map(String::as_str), Some("key"));
    }

    #[test]
    fn test_google_parse() {
        let body = r#"{
            "kind": "customsearch#search",
            "items": [
                {"title": "Rust", "link": "https://www.rust-lang.org/", "snippet": "A language"},
                {"title": "Crates", "link": "https://crates.io/"}
            ]
        }"#;
        let items = Google::new()
            .parse(&ProviderResponse::ok(body), &config())
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url.as_deref(), Some("https://www.rust-lang.org/"));
        assert_eq!(items[1].snippet, None);
    }

    #[test]
    fn test_google_no_items() {
        let items = Google::new()
            .parse(&ProviderResponse::ok(r#"{"kind": "customsearch#search"}"#), &config())
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_google_validation() {
        let google = Google::new();
        assert!(google.validate(&config()).is_ok());

        let no_cx = ProviderConfig::new("google", ProviderKind::Google).with_api_key("key");
        assert!(google.validate(&no_cx).is_err());

        let no_key = ProviderConfig::new("google", ProviderKind::Google).with_param("cx", "e");
        assert!(google.validate(&no_key).is_err());
    }
}
