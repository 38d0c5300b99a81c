//! Canonical identity keys for deduplication
//!
//! Two results are "the same" when their URLs normalize to the same string:
//! scheme and host lower-cased, default port dropped, fragment dropped,
//! tracking parameters removed, remaining parameters sorted and the trailing
//! slash removed.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Tracking parameters stripped unless the settings override the list
pub const DEFAULT_TRACKING_PARAMS: &[&str] = &[
    // Google
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "gclsrc",
    // Facebook
    "fbclid",
    "fb_action_ids",
    "fb_action_types",
    "fb_source",
    "fb_ref",
    // Microsoft
    "msclkid",
    // Twitter
    "twclid",
    // Mailchimp
    "mc_eid",
    "mc_cid",
    // HubSpot
    "_hsenc",
    "_hsmi",
    "__hstc",
    "__hsfp",
    "hsctatracking",
    // Adobe
    "s_kwcid",
    // General
    "ref",
    "ref_",
    "click_id",
    "campaign_id",
    "ad_id",
];

static TRACKING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"^utm_.*$", r"^_ga.*$"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Derives identity keys from provider URLs
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    tracking_params: HashSet<String>,
}

impl Default for UrlNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKING_PARAMS.iter().copied())
    }
}

impl UrlNormalizer {
    pub fn new<I, S>(tracking_params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tracking_params: tracking_params
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    fn is_tracking_param(&self, param: &str) -> bool {
        let param = param.to_lowercase();
        self.tracking_params.contains(&param)
            || TRACKING_PATTERNS.iter().any(|re| re.is_match(&param))
    }

    /// Normalize an http(s) URL.
    ///
    /// Returns `None` for empty input, unparseable input, other schemes and
    /// URLs without a host.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let mut parsed = Url::parse(raw).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return None;
        }

        parsed.set_fragment(None);

        // Url::parse already drops ports that are the scheme default
        if matches!(
            (parsed.scheme(), parsed.port()),
            ("http", Some(80)) | ("https", Some(443))
        ) {
            let _ = parsed.set_port(None);
        }

        let mut pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(key, _)| !self.is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.sort();

        if pairs.is_empty() {
            parsed.set_query(None);
        } else {
            parsed.query_pairs_mut().clear().extend_pairs(pairs);
        }

        let path = parsed.path().to_string();
        if path.len() > 1 && path.ends_with('/') {
            parsed.set_path(path.trim_end_matches('/'));
        }

        Some(parsed.to_string())
    }

    /// Identity key for one provider result.
    ///
    /// Results whose URL cannot be normalized get a key unique to the
    /// provider and rank, so they are kept but never deduplicated.
    pub fn identity_key(&self, url: &str, provider: &str, rank: u32) -> String {
        self.normalize(url)
            .unwrap_or_else(|| format!("unresolved:{provider}:{rank}"))
    }
}

/// Host of `url` matches `domain` exactly or as a subdomain
pub fn host_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('.').to_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain || host.ends_with(&format!(".{domain}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(url: &str) -> Option<String> {
        UrlNormalizer::default().normalize(url)
    }

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!(
            norm("HTTPS://Example.COM/Path").as_deref(),
            Some("https://example.com/Path")
        );
    }

    #[test]
    fn removes_trailing_slash_but_keeps_root() {
        assert_eq!(
            norm("https://example.com/path/").as_deref(),
            Some("https://example.com/path")
        );
        assert_eq!(
            norm("https://example.com").as_deref(),
            Some("https://example.com/")
        );
    }

    #[test]
    fn removes_default_ports() {
        assert_eq!(
            norm("http://example.com:80/a").as_deref(),
            Some("http://example.com/a")
        );
        assert_eq!(
            norm("https://example.com:443/a").as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(
            norm("https://example.com:8443/a").as_deref(),
            Some("https://example.com:8443/a")
        );
    }

    #[test]
    fn strips_tracking_and_fragment() {
        assert_eq!(
            norm("https://example.com/page?q=rust&utm_source=x&fbclid=1&_ga=2#top").as_deref(),
            Some("https://example.com/page?q=rust")
        );
    }

    #[test]
    fn sorts_remaining_params() {
        assert_eq!(
            norm("https://example.com/s?z=1&a=2").as_deref(),
            Some("https://example.com/s?a=2&z=1")
        );
    }

    #[test]
    fn tracking_param_and_trailing_slash_variants_collide() {
        assert_eq!(
            norm("https://x.com/p/?utm_campaign=spring"),
            norm("https://x.com/p")
        );
    }

    #[test]
    fn custom_tracking_list() {
        let normalizer = UrlNormalizer::new(["sessionid"]);
        assert_eq!(
            normalizer
                .normalize("https://example.com/?sessionid=42&id=7")
                .as_deref(),
            Some("https://example.com/?id=7")
        );
        // utm_* is always stripped by pattern
        assert_eq!(
            normalizer
                .normalize("https://example.com/?utm_medium=cpc")
                .as_deref(),
            Some("https://example.com/")
        );
    }

    #[test]
    fn rejects_unusable_urls() {
        assert_eq!(norm(""), None);
        assert_eq!(norm("   "), None);
        assert_eq!(norm("not a url"), None);
        assert_eq!(norm("mailto:someone@example.com"), None);
        assert_eq!(norm("/relative/path"), None);
    }

    #[test]
    fn synthetic_keys_are_unique_per_result() {
        let normalizer = UrlNormalizer::default();
        let a = normalizer.identity_key("", "bing", 1);
        let b = normalizer.identity_key("", "bing", 2);
        let c = normalizer.identity_key("", "brave", 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("unresolved:"));
    }

    #[test]
    fn host_matching() {
        assert!(host_matches("csdn.net", "csdn.net"));
        assert!(host_matches("blog.csdn.net", "csdn.net"));
        assert!(!host_matches("notcsdn.net", "csdn.net"));
        assert!(!host_matches("example.com", ""));
    }
}
