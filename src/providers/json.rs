//! Generic JSON API provider
//!
//! Any search API that answers with JSON can be described in configuration:
//! an endpoint template, where the result list lives and which fields hold
//! the title, URL, snippet and publication date.

use super::traits::*;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{ConfigError, ProviderFailure};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use url::Url;

const QUERY_PLACEHOLDERS: &[&str] = &["{query}", "{q}", "{keyword}", "{search}"];
const KEY_PLACEHOLDERS: &[&str] = &["{apikey}", "{api_key}", "{key}"];
const QUERY_PARAMS: &[&str] = &["q", "keyword", "query", "search"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Configurable JSON provider
#[derive(Debug, Default)]
pub struct JsonApi;

impl JsonApi {
    pub fn new() -> Self {
        Self
    }

    /// Fill in the endpoint template.
    ///
    /// Returns the URL and whether the query was placed by a placeholder.
    fn expand_endpoint(template: &str, query: &str, api_key: &str) -> (String, bool) {
        let query = urlencoding::encode(query);
        let api_key = urlencoding::encode(api_key);

        let mut url = template.to_string();
        let mut placed = false;
        for ph in QUERY_PLACEHOLDERS {
            if url.contains(ph) {
                url = url.replace(ph, &query);
                placed = true;
            }
        }
        for ph in KEY_PLACEHOLDERS {
            url = url.replace(ph, &api_key);
        }
        (url, placed)
    }

    fn has_query_param(url: &Url) -> bool {
        url.query_pairs()
            .any(|(k, _)| QUERY_PARAMS.contains(&k.to_lowercase().as_str()))
    }

    /// The list of result objects inside a payload
    fn locate_items<'a>(json: &'a Value, results_path: Option<&str>) -> Vec<&'a Value> {
        if let Some(path) = results_path.map(str::trim).filter(|p| !p.is_empty()) {
            return match value_at(json, path) {
                Some(Value::Array(items)) => items.iter().collect(),
                Some(obj @ Value::Object(_)) => vec![obj],
                _ => Vec::new(),
            };
        }

        match json {
            Value::Object(map) => {
                for key in ["results", "items"] {
                    if let Some(Value::Array(items)) = map.get(key) {
                        return items.iter().collect();
                    }
                }
                vec![json]
            }
            Value::Array(items) => items.iter().collect(),
            _ => Vec::new(),
        }
    }

    fn read_item(item: &Value, config: &ProviderConfig) -> ProviderItem {
        if !item.is_object() {
            return ProviderItem::default();
        }
        let mapping = &config.mapping;
        let published_key = mapping.published.as_deref();

        ProviderItem {
            title: mapped_text(item, mapping.title.as_deref(), "title"),
            url: mapped_text(item, mapping.url.as_deref(), "url"),
            snippet: mapped_text(item, mapping.snippet.as_deref(), "snippet"),
            published: published_key
                .and_then(|k| item.get(k))
                .filter(|v| !v.is_null())
                .or_else(|| item.get("publish_date"))
                .and_then(parse_published),
        }
    }
}

/// Follow a dotted path through nested objects
fn value_at<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    path.trim_start_matches('.')
        .split('.')
        .filter(|p| !p.is_empty())
        .try_fold(json, |cur, part| cur.as_object()?.get(part))
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read `key` if configured, falling back to `fallback`
fn mapped_text(item: &Value, key: Option<&str>, fallback: &str) -> Option<String> {
    key.and_then(|k| item.get(k))
        .and_then(text_of)
        .or_else(|| item.get(fallback).and_then(text_of))
}

fn from_unix(ts: f64) -> Option<DateTime<Utc>> {
    let secs = if ts > 1e12 { ts / 1000.0 } else { ts };
    if !secs.is_finite() {
        return None;
    }
    Utc.timestamp_opt(secs.trunc() as i64, 0).single()
}

/// Parse a publication date in any of the formats providers commonly use.
///
/// Naive values are taken as UTC. Numbers are Unix timestamps, in
/// milliseconds when larger than 10^12.
pub fn parse_published(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(from_unix),
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

pub fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<f64>().ok().and_then(from_unix);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}

impl Provider for JsonApi {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Json
    }

    fn request(&self, query: &str, config: &ProviderConfig) -> Result<ProviderRequest, ProviderFailure> {
        let template = config
            .endpoint
            .as_deref()
            .ok_or_else(|| ProviderFailure::Internal(format!("{}: no endpoint configured", config.name)))?;
        let api_key = config.api_key.as_deref().unwrap_or_default();

        let (expanded, placed) = Self::expand_endpoint(template, query, api_key);
        let url = Url::parse(&expanded)
            .map_err(|e| ProviderFailure::Internal(format!("{}: invalid endpoint: {e}", config.name)))?;

        let mut request = ProviderRequest::get(url.as_str()).params(&config.params);
        if !placed && !Self::has_query_param(&url) {
            request = request.param("q", query);
        }
        if let Some(header) = config.key_header.as_deref().filter(|h| !h.is_empty()) {
            request = request.header(header, api_key);
        }

        Ok(request)
    }

    fn parse(
        &self,
        response: &ProviderResponse,
        config: &ProviderConfig,
    ) -> Result<Vec<ProviderItem>, ProviderFailure> {
        let json: Value = response.json()?;
        let items = Self::locate_items(&json, config.mapping.results_path.as_deref());
        Ok(items
            .into_iter()
            .map(|item| Self::read_item(item, config))
            .collect())
    }

    fn validate(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
        match config.endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::provider(&config.name, "json providers need an endpoint")),
        }
    }
}
