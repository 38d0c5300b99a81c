//! Result type definitions

use crate::error::ProviderFailure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One result as emitted by a single provider adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProviderResult {
    /// Title as returned by the provider
    pub title: String,
    /// URL as returned by the provider (not normalized)
    pub url: String,
    /// Snippet/description
    pub snippet: String,
    /// 1-based position in the list the adapter emitted
    pub rank: u32,
    /// Name of the provider that returned this result
    pub provider: String,
    /// Publication time, if the provider reported one
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
}

impl RawProviderResult {
    pub fn new(
        provider: impl Into<String>,
        rank: u32,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: String::new(),
            rank,
            provider: provider.into(),
            published: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }
}

/// Evidence that a provider returned a record at a given rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub provider: String,
    pub rank: u32,
}

/// The deduplicated, cross-provider view of one distinct result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Normalized identity key, unique within one result set
    pub key: String,
    /// URL to display, from the provider that supplied the title
    pub url: String,
    pub title: String,
    pub snippet: String,
    /// Provider whose title and snippet are shown
    pub source: String,
    /// Newest publication time reported by any contributor
    pub published: Option<DateTime<Utc>>,
    /// Host is on the configured whitelist
    #[serde(default)]
    pub whitelisted: bool,
    contributions: Vec<Contribution>,
    weight: Option<f64>,
    #[serde(skip)]
    source_trust: f64,
    /// Lower-cased titles and snippets of every contributing result
    #[serde(skip)]
    match_text: String,
}

impl CanonicalRecord {
    /// Seed a record from the first result seen under `key`
    pub fn new(key: String, raw: RawProviderResult, trust: f64) -> Self {
        let match_text = searchable_text(&raw);
        Self {
            key,
            url: raw.url,
            title: raw.title,
            snippet: raw.snippet,
            source: raw.provider.clone(),
            published: raw.published,
            whitelisted: false,
            contributions: vec![Contribution {
                provider: raw.provider,
                rank: raw.rank,
            }],
            weight: None,
            source_trust: trust,
            match_text,
        }
    }

    /// Fold another provider's result for the same key into this record.
    ///
    /// Title, snippet and display URL move to the new provider only when its
    /// trust is strictly higher than the current source's. A provider that
    /// repeats a URL keeps its best rank instead of contributing twice.
    pub fn absorb(&mut self, raw: RawProviderResult, trust: f64) {
        self.match_text.push('\n');
        self.match_text.push_str(&searchable_text(&raw));

        if let Some(existing) = self
            .contributions
            .iter_mut()
            .find(|c| c.provider == raw.provider)
        {
            existing.rank = existing.rank.min(raw.rank);
        } else {
            self.contributions.push(Contribution {
                provider: raw.provider.clone(),
                rank: raw.rank,
            });
        }

        self.published = match (self.published, raw.published) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        if trust > self.source_trust {
            self.url = raw.url;
            self.title = raw.title;
            self.snippet = raw.snippet;
            self.source = raw.provider;
            self.source_trust = trust;
        }
    }

    /// Per-provider contributions, in the order they were merged
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    /// Number of distinct providers that returned this record
    pub fn provider_count(&self) -> usize {
        self.contributions
            .iter()
            .map(|c| c.provider.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Whether `provider` contributed to this record
    pub fn has_provider(&self, provider: &str) -> bool {
        self.contributions.iter().any(|c| c.provider == provider)
    }

    /// Text from all contributors that query terms are matched against.
    ///
    /// Does not depend on which provider supplies the displayed title, so
    /// trust changes cannot alter it.
    pub fn match_text(&self) -> &str {
        &self.match_text
    }

    /// Final weight, absent until the ranker has run
    pub fn weight(&self) -> Option<f64> {
        self.weight
    }

    /// Host of the display URL, lower-cased
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    }

    pub(crate) fn set_weight(&mut self, weight: f64) {
        debug_assert!(self.weight.is_none(), "weight is assigned once");
        self.weight = Some(weight);
    }
}

fn searchable_text(raw: &RawProviderResult) -> String {
    format!("{} {}", raw.title, raw.snippet).to_lowercase()
}

/// Execution status of one provider in one aggregation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded { results: usize },
    TimedOut,
    Failed { error: ProviderFailure },
}

/// Per-provider status report entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub provider: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    /// Wall time spent on this provider in milliseconds
    pub elapsed_ms: u64,
}

impl ProviderOutcome {
    pub fn from_result(
        provider: impl Into<String>,
        result: &std::result::Result<Vec<RawProviderResult>, ProviderFailure>,
        elapsed_ms: u64,
    ) -> Self {
        let status = match result {
            Ok(results) => OutcomeStatus::Succeeded {
                results: results.len(),
            },
            Err(ProviderFailure::Timeout) => OutcomeStatus::TimedOut,
            Err(error) => OutcomeStatus::Failed {
                error: error.clone(),
            },
        };
        Self {
            provider: provider.into(),
            status,
            elapsed_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { .. })
    }
}

/// Overall status of one aggregation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateStatus {
    /// Every dispatched provider succeeded
    Complete,
    /// Some providers succeeded, others failed or timed out
    Partial,
    /// No provider produced a usable response
    AllProvidersFailed,
    /// The query text was blank; nothing was dispatched
    EmptyQuery,
}

impl AggregateStatus {
    pub fn from_outcomes(outcomes: &[ProviderOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        if succeeded == 0 {
            Self::AllProvidersFailed
        } else if succeeded == outcomes.len() {
            Self::Complete
        } else {
            Self::Partial
        }
    }
}

/// Ranked records plus the per-provider report of one aggregation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    pub records: Vec<CanonicalRecord>,
    pub outcomes: Vec<ProviderOutcome>,
    pub status: AggregateStatus,
}

impl AggregationResult {
    pub fn empty_query() -> Self {
        Self {
            records: Vec::new(),
            outcomes: Vec::new(),
            status: AggregateStatus::EmptyQuery,
        }
    }

    /// Providers that failed or timed out, for advisory display
    pub fn unresponsive(&self) -> Vec<&ProviderOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }

    pub fn all_failed(&self) -> bool {
        self.status == AggregateStatus::AllProvidersFailed
    }
}
