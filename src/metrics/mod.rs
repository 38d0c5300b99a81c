//! Metrics collection module
//!
//! Tracks provider performance, error rates and usage statistics.

use crate::results::{OutcomeStatus, ProviderOutcome};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Response times kept per provider
const RESPONSE_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct Counters {
    searches: u64,
    successes: u64,
    errors: u64,
    timeouts: u64,
    response_times: VecDeque<u64>,
}

/// In-process metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total aggregation count
    total_searches: AtomicU64,
    /// Aggregations answered from the cache
    cache_hits: AtomicU64,
    providers: RwLock<HashMap<String, Counters>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment total search count
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one provider's outcome for one call
    pub fn record_outcome(&self, outcome: &ProviderOutcome) {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let counters = providers.entry(outcome.provider.clone()).or_default();

        counters.searches += 1;
        match outcome.status {
            OutcomeStatus::Succeeded { .. } => counters.successes += 1,
            OutcomeStatus::TimedOut => counters.timeouts += 1,
            OutcomeStatus::Failed { .. } => counters.errors += 1,
        }

        // Keep the last RESPONSE_WINDOW response times
        if counters.response_times.len() >= RESPONSE_WINDOW {
            counters.response_times.pop_front();
        }
        counters.response_times.push_back(outcome.elapsed_ms);
    }

    /// Get total searches
    pub fn get_total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    pub fn get_cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Statistics for one provider
    pub fn get_provider_stats(&self, provider: &str) -> Option<ProviderStats> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers.get(provider).map(ProviderStats::from)
    }

    /// Get all provider statistics
    pub fn get_all_stats(&self) -> HashMap<String, ProviderStats> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers
            .iter()
            .map(|(name, counters)| (name.clone(), ProviderStats::from(counters)))
            .collect()
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStats {
    pub searches: u64,
    pub successes: u64,
    pub errors: u64,
    pub timeouts: u64,
    /// Mean of the recent response times, in milliseconds
    pub avg_response_time: Option<u64>,
    /// Share of successful calls, in percent
    pub reliability: f64,
}

impl From<&Counters> for ProviderStats {
    fn from(counters: &Counters) -> Self {
        let avg_response_time = (!counters.response_times.is_empty()).then(|| {
            counters.response_times.iter().sum::<u64>() / counters.response_times.len() as u64
        });
        let reliability = if counters.searches == 0 {
            100.0
        } else {
            counters.successes as f64 / counters.searches as f64 * 100.0
        };

        Self {
            searches: counters.searches,
            successes: counters.successes,
            errors: counters.errors,
            timeouts: counters.timeouts,
            avg_response_time,
            reliability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderFailure;

    fn outcome(provider: &str, status: OutcomeStatus, elapsed_ms: u64) -> ProviderOutcome {
        ProviderOutcome {
            provider: provider.to_string(),
            status,
            elapsed_ms,
        }
    }

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.inc_search();
        metrics.record_outcome(&outcome("wiki", OutcomeStatus::Succeeded { results: 3 }, 100));

        assert_eq!(metrics.get_total_searches(), 1);
        let stats = metrics.get_provider_stats("wiki").unwrap();
        assert_eq!(stats.avg_response_time, Some(100));
        assert_eq!(stats.reliability, 100.0);
    }

    #[test]
    fn test_failures_and_timeouts() {
        let metrics = Metrics::new();
        metrics.record_outcome(&outcome("bing", OutcomeStatus::Succeeded { results: 1 }, 100));
        metrics.record_outcome(&outcome("bing", OutcomeStatus::TimedOut, 500));
        metrics.record_outcome(&outcome(
            "bing",
            OutcomeStatus::Failed {
                error: ProviderFailure::RateLimited,
            },
            30,
        ));
        metrics.record_outcome(&outcome("bing", OutcomeStatus::Succeeded { results: 0 }, 10));

        let stats = metrics.get_provider_stats("bing").unwrap();
        assert_eq!((stats.searches, stats.successes, stats.errors, stats.timeouts), (4, 2, 1, 1));
        assert_eq!(stats.reliability, 50.0);
        assert_eq!(stats.avg_response_time, Some(160));
        assert!(metrics.get_provider_stats("google").is_none());
    }

    #[test]
    fn test_response_window() {
        let metrics = Metrics::new();
        for ms in 0..150 {
            metrics.record_outcome(&outcome("ddg", OutcomeStatus::Succeeded { results: 1 }, ms));
        }
        // Window holds 50..150
        let stats = metrics.get_provider_stats("ddg").unwrap();
        assert_eq!(stats.avg_response_time, Some(99));
        assert_eq!(metrics.get_all_stats().len(), 1);
    }
}
