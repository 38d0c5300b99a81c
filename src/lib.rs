//! EasySearch: aggregate several search-engine APIs into one ranked list
//!
//! A query is sent concurrently to every enabled provider. The answers that
//! arrive in time are deduplicated by normalized URL and weighted by provider
//! trust, position, corroboration, term match, site and freshness signals.
//! Provider failures are reported next to the results, never raised.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod network;
pub mod providers;
pub mod results;
pub mod search;

pub use config::{ProviderConfig, ProviderKind, Settings};
pub use error::{ConfigError, ProviderFailure};
pub use results::{AggregateStatus, AggregationResult, CanonicalRecord, ProviderOutcome};
pub use search::{Aggregator, SearchQuery};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
