//! Provider traits and types

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{ConfigError, ProviderFailure};
use crate::network::Transport;
use crate::results::RawProviderResult;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// HTTP request to be made for a provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: BTreeMap<String, String>,
    /// Form body for POST requests
    pub form: Option<BTreeMap<String, String>>,
}

impl ProviderRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: BTreeMap::new(),
            form: None,
        }
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url)
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add every configured extra parameter
    pub fn params<'a, I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (k, v) in extra {
            self.params.insert(k.clone(), v.clone());
        }
        self
    }

    /// Add form data
    pub fn form(mut self, data: BTreeMap<String, String>) -> Self {
        self.form = Some(data);
        self
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// HTTP response to a provider request
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl ProviderResponse {
    /// A 200 response with the given body
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            text: text.into(),
            url: String::new(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProviderFailure> {
        serde_json::from_str(&self.text)
            .map_err(|e| ProviderFailure::MalformedResponse(format!("invalid JSON: {e}")))
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response is a bot-check page
    pub fn is_captcha(&self) -> bool {
        self.text.contains("captcha")
            || self.text.contains("CAPTCHA")
            || self.text.contains("unusual traffic")
            || self.text.contains("anomaly-modal")
    }
}

/// One result as read from a payload, before validation and ranking
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl ProviderItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    fn text(value: Option<String>) -> Option<String> {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Convert into a ranked result, or `None` without a title or URL
    fn into_raw(self, provider: &str, rank: u32) -> Option<RawProviderResult> {
        let title = Self::text(self.title)?;
        let url = Self::text(self.url)?;
        let mut raw = RawProviderResult::new(provider, rank, url, title);
        if let Some(snippet) = Self::text(self.snippet) {
            raw = raw.with_snippet(snippet);
        }
        raw.published = self.published;
        Some(raw)
    }
}

/// Adapter for one kind of search API.
///
/// Adapters are stateless: everything provider-specific comes from the
/// [`ProviderConfig`] passed to each call.
pub trait Provider: Send + Sync {
    /// Which configured kind this adapter serves
    fn kind(&self) -> ProviderKind;

    /// Build the HTTP request for a search
    fn request(&self, query: &str, config: &ProviderConfig) -> Result<ProviderRequest, ProviderFailure>;

    /// Translate a successful response into items, in the provider's order
    fn parse(
        &self,
        response: &ProviderResponse,
        config: &ProviderConfig,
    ) -> Result<Vec<ProviderItem>, ProviderFailure>;

    /// Optional validation of configuration
    fn validate(&self, _config: &ProviderConfig) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Check that a key-based provider has its key
pub(crate) fn require_api_key(config: &ProviderConfig) -> Result<(), ConfigError> {
    match config.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::provider(&config.name, "an api_key is required")),
    }
}

/// Query one provider and return its normalized, ranked results.
///
/// Items without a title or URL are dropped; ranks are the 1-based positions
/// of the items that remain.
pub async fn fetch(
    provider: &dyn Provider,
    transport: &dyn Transport,
    query: &str,
    config: &ProviderConfig,
) -> Result<Vec<RawProviderResult>, ProviderFailure> {
    let request = provider.request(query, config)?;
    let response = transport.execute(request).await?;

    if let Some(failure) = ProviderFailure::from_status(response.status) {
        return Err(failure);
    }

    let items = provider.parse(&response, config)?;
    let total = items.len();
    let limit = config.max_results.map_or(usize::MAX, |n| n as usize);

    let results: Vec<RawProviderResult> = items
        .into_iter()
        .filter_map(|item| item.into_raw(&config.name, 0))
        .take(limit)
        .enumerate()
        .map(|(i, mut raw)| {
            raw.rank = i as u32 + 1;
            raw
        })
        .collect();

    if results.len() < total.min(limit) {
        debug!(
            "{}: dropped {} items without title or URL",
            config.name,
            total.min(limit) - results.len()
        );
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(ProviderResponse);

    #[async_trait]
    impl Transport for Fixed {
        async fn execute(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderFailure> {
            Ok(self.0.clone())
        }
    }

    struct Lines;

    impl Provider for Lines {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Json
        }

        fn request(&self, query: &str, _config: &ProviderConfig) -> Result<ProviderRequest, ProviderFailure> {
            Ok(ProviderRequest::get("https://lines.test/").param("q", query))
        }

        // One item per line: `title|url`
        fn parse(
            &self,
            response: &ProviderResponse,
            _config: &ProviderConfig,
        ) -> Result<Vec<ProviderItem>, ProviderFailure> {
            Ok(response
                .text
                .lines()
                .map(|line| {
                    let mut parts = line.splitn(2, '|');
                    ProviderItem {
                        title: parts.next().map(str::to_string),
                        url: parts.next().map(str::to_string),
                        ..Default::default()
                    }
                })
                .collect())
        }
    }

    fn config() -> ProviderConfig {
        ProviderConfig::new("lines", ProviderKind::Json)
    }

    #[tokio::test]
    async fn test_ranks_follow_emitted_order() {
        let body = "One|https://one.test\n|https://untitled.test\nTwo|\nThree|https://three.test";
        let transport = Fixed(ProviderResponse::ok(body));

        let results = fetch(&Lines, &transport, "q", &config()).await.unwrap();

        let summary: Vec<(u32, &str)> = results.iter().map(|r| (r.rank, r.title.as_str())).collect();
        assert_eq!(summary, vec![(1, "One"), (2, "Three")]);
        assert!(results.iter().all(|r| r.provider == "lines"));
    }

    #[tokio::test]
    async fn test_max_results_applies_after_dropping() {
        let body = "|https://skip.test\nA|https://a.test\nB|https://b.test\nC|https://c.test";
        let transport = Fixed(ProviderResponse::ok(body));
        let mut config = config();
        config.max_results = Some(2);

        let results = fetch(&Lines, &transport, "q", &config).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].title, "B");
        assert_eq!(results[1].rank, 2);
    }

    #[tokio::test]
    async fn test_status_codes_become_failures() {
        for (status, expected) in [
            (401, ProviderFailure::Auth("HTTP 401".to_string())),
            (429, ProviderFailure::RateLimited),
            (500, ProviderFailure::Transport("HTTP 500".to_string())),
        ] {
            let transport = Fixed(ProviderResponse::ok("A|https://a.test").with_status(status));
            let err = fetch(&Lines, &transport, "q", &config()).await.unwrap_err();
            assert_eq!(err, expected);
        }
    }

    #[test]
    fn test_request_builder() {
        let request = ProviderRequest::post("https://x.test/")
            .header("X-Key", "k")
            .param("q", "rust");
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.headers.get("X-Key").map(String::as_str), Some("k"));
        assert_eq!(request.params.get("q").map(String::as_str), Some("rust"));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let response = ProviderResponse::ok("<html>");
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, ProviderFailure::MalformedResponse(_)));
    }
}
