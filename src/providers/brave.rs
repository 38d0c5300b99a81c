//! Brave Search API provider

use super::json::parse_date_str;
use super::traits::*;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{ConfigError, ProviderFailure};
use serde::Deserialize;

const DEFAULT_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    page_age: Option<String>,
}

/// Brave web search
#[derive(Debug, Default)]
pub struct Brave;

impl Brave {
    pub fn new() -> Self {
        Self
    }
}

impl Provider for Brave {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Brave
    }

    fn request(&self, query: &str, config: &ProviderConfig) -> Result<ProviderRequest, ProviderFailure> {
        let endpoint = config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let header = config.key_header.as_deref().unwrap_or("X-Subscription-Token");

        let mut request = ProviderRequest::get(endpoint)
            .param("q", query)
            .header("Accept", "application/json")
            .header(header, config.api_key.clone().unwrap_or_default())
            .params(&config.params);
        if let Some(count) = config.max_results {
            request = request.param("count", count.min(20).to_string());
        }

        Ok(request)
    }

    fn parse(
        &self,
        response: &ProviderResponse,
        _config: &ProviderConfig,
    ) -> Result<Vec<ProviderItem>, ProviderFailure> {
        let body: BraveResponse = response.json()?;
        let results = body.web.map(|w| w.results).unwrap_or_default();

        Ok(results
            .into_iter()
            .map(|r| ProviderItem {
                title: r.title,
                url: r.url,
                snippet: r.description,
                published: r.page_age.as_deref().and_then(parse_date_str),
            })
            .collect())
    }

    fn validate(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
        require_api_key(config)
    }
}
