//! Cross-provider deduplication

use super::types::{CanonicalRecord, RawProviderResult};
use super::url::UrlNormalizer;
use crate::config::ProviderConfig;
use std::collections::HashMap;
use tracing::debug;

/// Trust assumed for providers missing from the configuration
pub const DEFAULT_TRUST: f64 = 1.0;

/// Folds raw provider results into canonical records keyed by normalized URL
#[derive(Debug, Clone)]
pub struct Merger {
    trust: HashMap<String, f64>,
    normalizer: UrlNormalizer,
}

impl Merger {
    pub fn new(configs: &[ProviderConfig]) -> Self {
        Self {
            trust: configs
                .iter()
                .map(|c| (c.name.clone(), c.trust))
                .collect(),
            normalizer: UrlNormalizer::default(),
        }
    }

    /// Use a custom tracking-parameter list
    pub fn with_normalizer(mut self, normalizer: UrlNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn trust_of(&self, provider: &str) -> f64 {
        self.trust.get(provider).copied().unwrap_or(DEFAULT_TRUST)
    }

    /// Merge results from all providers.
    ///
    /// Records come out in first-seen order; callers should not rely on it.
    pub fn merge<I>(&self, results: I) -> Vec<CanonicalRecord>
    where
        I: IntoIterator<Item = RawProviderResult>,
    {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut records: Vec<CanonicalRecord> = Vec::new();
        let mut seen = 0usize;

        for result in results {
            seen += 1;
            let key = self
                .normalizer
                .identity_key(&result.url, &result.provider, result.rank);
            let trust = self.trust_of(&result.provider);

            match index.get(&key) {
                Some(&i) => records[i].absorb(result, trust),
                None => {
                    index.insert(key.clone(), records.len());
                    records.push(CanonicalRecord::new(key, result, trust));
                }
            }
        }

        debug!("Merged {} results into {} records", seen, records.len());
        records
    }
}

/// Merge with default normalization and the trust values from `configs`
pub fn merge<I>(results: I, configs: &[ProviderConfig]) -> Vec<CanonicalRecord>
where
    I: IntoIterator<Item = RawProviderResult>,
{
    Merger::new(configs).merge(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;

    fn configs() -> Vec<ProviderConfig> {
        vec![
            ProviderConfig::new("a", ProviderKind::Json).with_trust(2.0),
            ProviderConfig::new("b", ProviderKind::Json).with_trust(1.0),
        ]
    }

    #[test]
    fn test_result_deduplication() {
        let results = vec![
            RawProviderResult::new("a", 1, "https://example.com/page?utm_source=news", "Example"),
            RawProviderResult::new("b", 2, "https://example.com/page/", "Example Site"),
        ];

        let records = merge(results, &configs());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contributions().len(), 2);
        assert_eq!(records[0].key, "https://example.com/page");
    }

    #[test]
    fn test_distinct_urls_stay_apart() {
        let results = vec![
            RawProviderResult::new("a", 1, "https://first.com", "First"),
            RawProviderResult::new("a", 2, "https://second.com", "Second"),
        ];
        let records = merge(results, &configs());
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.contributions().len() == 1));
    }

    #[test]
    fn test_higher_trust_supplies_text() {
        let results = vec![
            RawProviderResult::new("b", 1, "https://x.com/p", "From B").with_snippet("b"),
            RawProviderResult::new("a", 3, "https://x.com/p", "From A").with_snippet("a"),
        ];
        let records = merge(results, &configs());
        assert_eq!(records[0].title, "From A");
        assert_eq!(records[0].snippet, "a");
        assert_eq!(records[0].source, "a");
    }

    #[test]
    fn test_unknown_provider_uses_default_trust() {
        let results = vec![
            RawProviderResult::new("stranger", 1, "https://x.com/p", "Stranger"),
            RawProviderResult::new("b", 1, "https://x.com/p", "From B"),
        ];
        // Both at trust 1.0: first seen keeps the title
        let records = merge(results, &configs());
        assert_eq!(records[0].title, "Stranger");
    }

    #[test]
    fn test_malformed_urls_are_kept_separately() {
        let results = vec![
            RawProviderResult::new("a", 1, "", "No URL"),
            RawProviderResult::new("b", 1, "", "No URL either"),
            RawProviderResult::new("b", 2, "javascript:void(0)", "Script"),
            RawProviderResult::new("a", 2, "https://ok.com", "Fine"),
        ];
        let records = merge(results, &configs());
        assert_eq!(records.len(), 4);
        assert_eq!(
            records.iter().filter(|r| r.key.starts_with("unresolved:")).count(),
            3
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(merge(Vec::new(), &configs()).is_empty());
    }
}
