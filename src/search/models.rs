//! Search query model

use crate::config::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One search action: query text plus per-call options.
///
/// Immutable once built; cloned into every provider task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The search query string
    pub text: String,
    /// Maximum number of ranked records to return
    #[serde(default)]
    pub limit: Option<usize>,
    /// Forces providers on (`true`) or off (`false`) for this call only
    #[serde(default)]
    pub overrides: BTreeMap<String, bool>,
}

impl SearchQuery {
    /// Create a query for a single string
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Force a provider on or off
    pub fn with_override(mut self, provider: impl Into<String>, enabled: bool) -> Self {
        self.overrides.insert(provider.into(), enabled);
        self
    }

    /// Check if query is blank
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Whether `config` takes part in this search
    pub fn is_enabled(&self, config: &ProviderConfig) -> bool {
        self.overrides
            .get(&config.name)
            .copied()
            .unwrap_or(config.enabled)
    }
}

impl From<&str> for SearchQuery {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;

    #[test]
    fn test_simple_query() {
        let query = SearchQuery::new("hello world");
        assert_eq!(query.text, "hello world");
        assert_eq!(query.limit, None);
        assert!(query.overrides.is_empty());
    }

    #[test]
    fn test_blank_query() {
        assert!(SearchQuery::new("").is_empty());
        assert!(SearchQuery::new(" \t\n").is_empty());
        assert!(!SearchQuery::new(" a ").is_empty());
    }

    #[test]
    fn test_overrides() {
        let on = ProviderConfig::new("on", ProviderKind::Wikipedia);
        let off = ProviderConfig::new("off", ProviderKind::Wikipedia).disabled();

        let plain = SearchQuery::new("rust");
        assert!(plain.is_enabled(&on));
        assert!(!plain.is_enabled(&off));

        let flipped = SearchQuery::new("rust")
            .with_override("on", false)
            .with_override("off", true);
        assert!(!flipped.is_enabled(&on));
        assert!(flipped.is_enabled(&off));
    }
}
