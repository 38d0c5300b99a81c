//! Weight computation and final ordering
//!
//! ```text
//! weight = Σ trust(provider) × position_score(rank)
//!          × duplication_bonus(distinct providers)
//!          × term_match × site × freshness
//! ```
//!
//! The last three factors never depend on trust or provider rank. Term match
//! reads the text of every contributor, so another corroborating provider can
//! only raise it. More trust, a better provider rank or more corroborating
//! providers therefore never lower a record's weight.

use super::merger::DEFAULT_TRUST;
use super::types::CanonicalRecord;
use super::url::host_matches;
use crate::config::{ProviderConfig, RankingSettings};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Score for a provider's own rank (1-based)
pub fn position_score(rank: u32) -> f64 {
    1.0 / f64::from(rank.max(1))
}

/// Multiplier for the number of distinct providers that returned a record
pub fn duplication_bonus(providers: usize) -> f64 {
    providers.max(1) as f64
}

/// Multiplier for how recently a result was published
pub fn freshness_factor(published: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    match (now - published).num_days() {
        0 => 1.5,
        1 => 1.4,
        2 => 1.3,
        3 => 1.2,
        4 => 1.1,
        d if d >= 30 => 0.5,
        _ => 1.0,
    }
}

/// Final ordering: weight descending, then more providers first, then key
pub fn compare(a: &CanonicalRecord, b: &CanonicalRecord) -> Ordering {
    let wa = a.weight().unwrap_or(0.0);
    let wb = b.weight().unwrap_or(0.0);
    wb.total_cmp(&wa)
        .then_with(|| b.provider_count().cmp(&a.provider_count()))
        .then_with(|| a.key.cmp(&b.key))
}

/// Scores and sorts merged records
#[derive(Debug, Clone)]
pub struct Ranker {
    trust: HashMap<String, f64>,
    settings: RankingSettings,
    query_terms: Vec<String>,
    reference_time: Option<DateTime<Utc>>,
}

impl Ranker {
    pub fn new(configs: &[ProviderConfig]) -> Self {
        Self {
            trust: configs
                .iter()
                .map(|c| (c.name.clone(), c.trust))
                .collect(),
            settings: RankingSettings::default(),
            query_terms: Vec::new(),
            reference_time: None,
        }
    }

    pub fn with_settings(mut self, settings: RankingSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Query text used for the term-match signal
    pub fn with_query(mut self, query: &str) -> Self {
        let mut seen = HashSet::new();
        self.query_terms = query
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|t| seen.insert(t.clone()))
            .collect();
        self
    }

    /// Instant freshness is measured against; without one freshness is ignored
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    fn trust_of(&self, provider: &str) -> f64 {
        self.trust.get(provider).copied().unwrap_or(DEFAULT_TRUST)
    }

    fn matches_any(host: &str, domains: &[String]) -> bool {
        domains.iter().any(|d| host_matches(host, d))
    }

    /// Record's host is on the blacklist
    pub fn is_blocked(&self, record: &CanonicalRecord) -> bool {
        record
            .host()
            .map_or(false, |h| Self::matches_any(&h, &self.settings.blacklist))
    }

    /// Σ trust × position score over contributions, before any bonus
    pub fn base_score(&self, record: &CanonicalRecord) -> f64 {
        record
            .contributions()
            .iter()
            .map(|c| self.trust_of(&c.provider) * position_score(c.rank))
            .sum()
    }

    /// Share of query terms found in any contributor's title or snippet,
    /// in `[0, 1]`
    pub fn term_match(&self, record: &CanonicalRecord) -> f64 {
        if self.query_terms.is_empty() {
            return 0.0;
        }
        let haystack = record.match_text();
        let matched = self
            .query_terms
            .iter()
            .filter(|t| haystack.contains(t.as_str()))
            .count();
        matched as f64 / self.query_terms.len() as f64
    }

    fn site_factor(&self, host: Option<&str>) -> f64 {
        let Some(host) = host else {
            return 1.0;
        };
        let mut factor = 1.0;
        if Self::matches_any(host, &self.settings.whitelist) {
            factor += self.settings.whitelist_bonus;
        }
        if Self::matches_any(host, &self.settings.authoritative_sites) {
            factor += self.settings.authority_bonus;
        }
        factor
    }

    fn freshness(&self, record: &CanonicalRecord) -> f64 {
        match (self.settings.freshness, record.published, self.reference_time) {
            (true, Some(published), Some(now)) => freshness_factor(published, now),
            _ => 1.0,
        }
    }

    /// Full weight of one record
    pub fn weigh(&self, record: &CanonicalRecord) -> f64 {
        let host = record.host();
        self.base_score(record)
            * duplication_bonus(record.provider_count())
            * (1.0 + self.settings.term_match_weight * self.term_match(record))
            * self.site_factor(host.as_deref())
            * self.freshness(record)
    }

    /// Drop blacklisted records, assign weights and sort.
    ///
    /// Each record's weight is assigned here exactly once.
    pub fn rank(&self, records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
        let total = records.len();
        let mut ranked: Vec<CanonicalRecord> = records
            .into_iter()
            .filter(|r| !self.is_blocked(r))
            .map(|mut record| {
                let weight = self.weigh(&record);
                record.whitelisted = record
                    .host()
                    .map_or(false, |h| Self::matches_any(&h, &self.settings.whitelist));
                record.set_weight(weight);
                record
            })
            .collect();

        if ranked.len() < total {
            debug!("Dropped {} blacklisted records", total - ranked.len());
        }

        ranked.sort_by(compare);
        ranked
    }
}

/// Rank with default signals and the trust values from `configs`
pub fn rank(records: Vec<CanonicalRecord>, configs: &[ProviderConfig]) -> Vec<CanonicalRecord> {
    Ranker::new(configs).rank(records)
}
