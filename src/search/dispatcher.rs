//! Concurrent fan-out of one query to every enabled provider

use super::models::SearchQuery;
use crate::config::{ProviderConfig, Settings};
use crate::error::ProviderFailure;
use crate::network::Transport;
use crate::providers::{fetch, ProviderRegistry};
use crate::results::RawProviderResult;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

/// Output of one provider task
pub type ProviderResult = Result<Vec<RawProviderResult>, ProviderFailure>;

/// One settled slot of a dispatch
#[derive(Debug, Clone)]
pub struct DispatchEntry {
    pub config: ProviderConfig,
    pub result: ProviderResult,
    pub elapsed: Duration,
}

struct Slot {
    config: ProviderConfig,
    started: Instant,
    handle: JoinHandle<(ProviderResult, Duration)>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        // No effect on finished tasks
        self.handle.abort();
    }
}

fn settle(
    config: ProviderConfig,
    started: Instant,
    joined: Result<(ProviderResult, Duration), JoinError>,
) -> DispatchEntry {
    let (result, elapsed) = match joined {
        Ok(output) => output,
        Err(e) => {
            let failure = if e.is_panic() {
                warn!("Provider task {} panicked", config.name);
                ProviderFailure::Internal("provider task panicked".to_string())
            } else {
                ProviderFailure::Internal("provider task was cancelled".to_string())
            };
            (Err(failure), started.elapsed())
        }
    };
    DispatchEntry {
        config,
        result,
        elapsed,
    }
}

/// Running provider tasks, one slot per provider in configuration order.
///
/// Dropping the handle, or a join future before it completes, aborts every
/// task still running.
pub struct DispatchHandle {
    slots: Vec<Slot>,
}

impl DispatchHandle {
    /// Number of providers dispatched
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Wait for every task to settle
    pub async fn join(self) -> Vec<DispatchEntry> {
        let mut slots = self.slots;
        let joined = join_all(slots.iter_mut().map(|slot| &mut slot.handle)).await;

        slots
            .iter_mut()
            .zip(joined)
            .map(|(slot, joined)| settle(std::mem::take(&mut slot.config), slot.started, joined))
            .collect()
    }

    /// Wait for tasks until `deadline`.
    ///
    /// Tasks still running at the deadline are aborted and reported as timed
    /// out; tasks that already finished keep their results.
    pub async fn join_until(self, deadline: Instant) -> Vec<DispatchEntry> {
        let mut entries = Vec::with_capacity(self.slots.len());
        for mut slot in self.slots {
            let config = std::mem::take(&mut slot.config);
            match timeout_at(deadline, &mut slot.handle).await {
                Ok(joined) => entries.push(settle(config, slot.started, joined)),
                Err(_) => {
                    // Dropping the slot aborts the task
                    warn!("Provider {} missed the global deadline", config.name);
                    entries.push(DispatchEntry {
                        elapsed: slot.started.elapsed(),
                        config,
                        result: Err(ProviderFailure::Timeout),
                    });
                }
            }
        }
        entries
    }
}

/// Issues one query to all enabled providers concurrently
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    transport: Arc<dyn Transport>,
    default_timeout: Duration,
    max_timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProviderRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
            default_timeout: Duration::from_secs(5),
            max_timeout: Duration::from_secs(30),
        }
    }

    /// Take the per-provider timeout defaults from settings
    pub fn from_settings(
        registry: Arc<ProviderRegistry>,
        transport: Arc<dyn Transport>,
        settings: &Settings,
    ) -> Self {
        Self::new(registry, transport)
            .with_timeout(Duration::from_secs_f64(settings.search.provider_timeout))
            .with_max_timeout(Duration::from_secs_f64(settings.search.max_provider_timeout))
    }

    /// Set default per-provider timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set maximum per-provider timeout
    pub fn with_max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = timeout;
        self
    }

    /// Effective timeout for one provider
    pub fn timeout_for(&self, config: &ProviderConfig) -> Duration {
        config
            .timeout
            .map(Duration::from_secs_f64)
            .unwrap_or(self.default_timeout)
            .min(self.max_timeout)
    }

    /// Start one task per enabled provider
    pub fn spawn(&self, query: &SearchQuery, configs: &[ProviderConfig]) -> DispatchHandle {
        let slots: Vec<Slot> = configs
            .iter()
            .filter(|config| query.is_enabled(config))
            .map(|config| Slot {
                config: config.clone(),
                started: Instant::now(),
                handle: self.spawn_provider(query.text.clone(), config.clone()),
            })
            .collect();

        info!("Dispatching '{}' to {} providers", query.text, slots.len());
        DispatchHandle { slots }
    }

    /// Query every enabled provider and wait for all of them
    pub async fn dispatch(&self, query: &SearchQuery, configs: &[ProviderConfig]) -> Vec<DispatchEntry> {
        self.spawn(query, configs).join().await
    }

    fn spawn_provider(&self, query: String, config: ProviderConfig) -> JoinHandle<(ProviderResult, Duration)> {
        let registry = Arc::clone(&self.registry);
        let transport = Arc::clone(&self.transport);
        let limit = self.timeout_for(&config);

        tokio::spawn(async move {
            let start = Instant::now();
            debug!("Searching provider {} with timeout {:?}", config.name, limit);

            let result = match registry.resolve(&config) {
                Ok(provider) => timeout(limit, fetch(provider.as_ref(), transport.as_ref(), &query, &config))
                    .await
                    .unwrap_or(Err(ProviderFailure::Timeout)),
                Err(failure) => Err(failure),
            };

            let elapsed = start.elapsed();
            match &result {
                Ok(results) => debug!(
                    "Provider {} returned {} results in {:?}",
                    config.name,
                    results.len(),
                    elapsed
                ),
                Err(e) => warn!("Provider {} failed after {:?}: {}", config.name, elapsed, e),
            }
            (result, elapsed)
        })
    }
}
