//! One query in, one ranked list out

use super::dispatcher::Dispatcher;
use super::models::SearchQuery;
use crate::cache::{query_cache_key, ResultCache};
use crate::config::{ProviderConfig, Settings};
use crate::metrics::Metrics;
use crate::network::{HttpClient, Transport};
use crate::providers::{ProviderLoader, ProviderRegistry};
use crate::results::url::UrlNormalizer;
use crate::results::{
    AggregateStatus, AggregationResult, Merger, OutcomeStatus, ProviderOutcome, Ranker,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Runs aggregation calls against a fixed set of collaborators
pub struct Aggregator {
    dispatcher: Dispatcher,
    settings: Arc<Settings>,
    cache: Option<ResultCache>,
    metrics: Arc<Metrics>,
}

impl Aggregator {
    /// Create an aggregator over an explicit registry and transport
    pub fn new(
        registry: Arc<ProviderRegistry>,
        transport: Arc<dyn Transport>,
        settings: Settings,
    ) -> Self {
        let dispatcher = Dispatcher::from_settings(registry, transport, &settings);
        Self {
            dispatcher,
            cache: ResultCache::from_settings(&settings.cache),
            settings: Arc::new(settings),
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Build the HTTP transport and provider registry from settings
    pub fn from_settings(settings: Settings) -> reqwest::Result<Self> {
        let client = HttpClient::with_settings(&settings.outgoing)?;
        let registry = ProviderLoader::load(&settings);
        Ok(Self::new(Arc::new(registry), Arc::new(client), settings))
    }

    /// Use a specific result cache
    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Share a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Aggregate over the configured providers with the configured budget
    pub async fn search(&self, query: &SearchQuery) -> AggregationResult {
        let settings = Arc::clone(&self.settings);
        self.aggregate(query, &settings.providers, settings.global_timeout())
            .await
    }

    /// Query every enabled provider in `configs`, then merge and rank.
    ///
    /// Returns within `global_timeout` plus local merge and rank time.
    /// Providers still pending at the deadline are reported as timed out.
    /// Provider failures never make this fail; they show up in the outcomes
    /// and the status.
    pub async fn aggregate(
        &self,
        query: &SearchQuery,
        configs: &[ProviderConfig],
        global_timeout: Duration,
    ) -> AggregationResult {
        if query.is_empty() {
            debug!("Empty query, nothing dispatched");
            return AggregationResult::empty_query();
        }
        self.metrics.inc_search();

        let cache_key = self
            .cache
            .as_ref()
            .map(|_| query_cache_key(query, configs, global_timeout));
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(cached) = cache.get(key).await {
                debug!("Cache hit for '{}'", query.text);
                self.metrics.inc_cache_hit();
                return cached;
            }
        }

        let reference_time = Utc::now();
        let deadline = Instant::now() + global_timeout;
        let entries = self
            .dispatcher
            .spawn(query, configs)
            .join_until(deadline)
            .await;

        let outcomes: Vec<ProviderOutcome> = entries
            .iter()
            .map(|entry| {
                ProviderOutcome::from_result(
                    &entry.config.name,
                    &entry.result,
                    entry.elapsed.as_millis() as u64,
                )
            })
            .collect();
        for outcome in &outcomes {
            self.metrics.record_outcome(outcome);
        }

        // Config order, so ties in the merge do not depend on arrival order
        let raw = entries
            .into_iter()
            .filter_map(|entry| entry.result.ok())
            .flatten();

        let ranking = &self.settings.ranking;
        let merged = Merger::new(configs)
            .with_normalizer(UrlNormalizer::new(&ranking.tracking_params))
            .merge(raw);
        let mut records = Ranker::new(configs)
            .with_settings(ranking.clone())
            .with_query(&query.text)
            .with_reference_time(reference_time)
            .rank(merged);

        if let Some(limit) = query.limit.or(self.settings.search.max_results) {
            records.truncate(limit);
        }

        let status = AggregateStatus::from_outcomes(&outcomes);
        match status {
            AggregateStatus::AllProvidersFailed => {
                warn!("All {} providers failed for '{}'", outcomes.len(), query.text)
            }
            _ => info!(
                "Search '{}' returned {} records from {}/{} providers",
                query.text,
                records.len(),
                outcomes.iter().filter(|o| o.is_success()).count(),
                outcomes.len()
            ),
        }

        let result = AggregationResult {
            records,
            outcomes,
            status,
        };

        // A provider that ran out of time may answer on the next call
        let settled = !result
            .outcomes
            .iter()
            .any(|o| o.status == OutcomeStatus::TimedOut);
        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
            if settled && status != AggregateStatus::AllProvidersFailed {
                cache.set(key, result.clone()).await;
            }
        }

        result
    }
}
