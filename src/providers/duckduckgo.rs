//! DuckDuckGo HTML search provider

use super::traits::*;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::ProviderFailure;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use url::Url;

const HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// DuckDuckGo web search, scraped from the no-JS endpoint
#[derive(Debug, Default)]
pub struct DuckDuckGo;

fn selector(css: &str) -> Result<Selector, ProviderFailure> {
    Selector::parse(css).map_err(|e| ProviderFailure::Internal(format!("bad selector {css}: {e}")))
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a result link to its target.
    ///
    /// Result links usually go through `/l/?uddg=<target>`; the target is
    /// returned decoded. Relative links are resolved against duckduckgo.com.
    fn resolve_link(href: &str) -> Option<String> {
        let base = Url::parse("https://duckduckgo.com/").ok()?;
        let link = base.join(href).ok()?;

        let is_ddg = link
            .host_str()
            .map_or(false, |h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"));
        if !is_ddg {
            return Some(link.to_string());
        }
        if link.path() == "/l/" {
            return link
                .query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned());
        }
        // Internal links (ads, settings) are not results
        None
    }

    fn parse_html_results(&self, html: &str) -> Result<Vec<ProviderItem>, ProviderFailure> {
        let document = Html::parse_document(html);

        let result_selector = selector("div.result")?;
        let title_selector = selector("a.result__a")?;
        let snippet_selector = selector(".result__snippet")?;

        let mut items = Vec::new();
        for element in document.select(&result_selector) {
            if element.value().classes().any(|c| c == "result--ad") {
                continue;
            }

            let Some(title_elem) = element.select(&title_selector).next() else {
                continue;
            };

            let title = title_elem.text().collect::<String>().trim().to_string();
            let url = title_elem.value().attr("href").and_then(Self::resolve_link);
            let snippet = element
                .select(&snippet_selector)
                .next()
                .map(|s| s.text().collect::<String>().trim().to_string());

            items.push(ProviderItem {
                title: Some(title),
                url,
                snippet,
                published: None,
            });
        }

        Ok(items)
    }
}

impl Provider for DuckDuckGo {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DuckDuckGo
    }

    fn request(&self, query: &str, config: &ProviderConfig) -> Result<ProviderRequest, ProviderFailure> {
        let endpoint = config.endpoint.as_deref().unwrap_or(HTML_URL);

        let mut form_data = BTreeMap::new();
        form_data.insert("q".to_string(), query.to_string());
        form_data.insert("b".to_string(), String::new());
        for (k, v) in &config.params {
            form_data.insert(k.clone(), v.clone());
        }

        Ok(ProviderRequest::post(endpoint).form(form_data))
    }

    fn parse(
        &self,
        response: &ProviderResponse,
        _config: &ProviderConfig,
    ) -> Result<Vec<ProviderItem>, ProviderFailure> {
        let items = self.parse_html_results(&response.text)?;
        if items.is_empty() && response.is_captcha() {
            return Err(ProviderFailure::RateLimited);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html><body>
        <div class="result results_links result--ad">
          <a class="result__a" href="https://duckduckgo.com/y.js?ad_provider=x">Sponsored</a>
        </div>
        <div class="result results_links">
          <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2Flearn&amp;rut=abc">Learn Rust</a></h2>
          <a class="result__snippet" href="#">Get started with <b>Rust</b></a>
        </div>
        <div class="result results_links">
          <a class="result__a" href="https://tokio.rs/">Tokio</a>
        </div>
        <div class="result results_links">
          <a class="result__a" href="/settings">Settings</a>
        </div>
        </body></html>
    "##;

    fn config() -> ProviderConfig {
        ProviderConfig::new("duckduckgo", ProviderKind::DuckDuckGo)
    }

    #[test]
    fn test_duckduckgo_request() {
        let request = DuckDuckGo::new().request("rust programming", &config()).unwrap();

        assert!(request.url.contains("duckduckgo.com"));
        assert_eq!(request.method, HttpMethod::Post);
        let form = request.form.unwrap();
        assert_eq!(form.get("q").map(String::as_str), Some("rust programming"));
    }

    #[test]
    fn test_parse_decodes_redirects_and_skips_ads() {
        let items = DuckDuckGo::new()
            .parse(&ProviderResponse::ok(PAGE), &config())
            .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title.as_deref(), Some("Learn Rust"));
        assert_eq!(items[0].url.as_deref(), Some("https://www.rust-lang.org/learn"));
        assert_eq!(items[0].snippet.as_deref(), Some("Get started with Rust"));
        assert_eq!(items[1].url.as_deref(), Some("https://tokio.rs/"));
        // Internal link: kept as an item without URL, dropped later
        assert_eq!(items[2].url, None);
    }

    #[test]
    fn test_bot_check_page_is_rate_limited() {
        let page = r#"<html><body><div class="anomaly-modal__title">Unfortunately, bots use DuckDuckGo too.</div></body></html>"#;
        let err = DuckDuckGo::new()
            .parse(&ProviderResponse::ok(page), &config())
            .unwrap_err();
        assert_eq!(err, ProviderFailure::RateLimited);
    }

    #[test]
    fn test_empty_page_is_no_results() {
        let items = DuckDuckGo::new()
            .parse(&ProviderResponse::ok("<html><body></body></html>"), &config())
            .unwrap();
        assert!(items.is_empty());
    }
}
