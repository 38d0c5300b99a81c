//! Provider loader for initializing adapters from configuration

use super::registry::ProviderRegistry;
use super::traits::Provider;
use super::{bing, brave, duckduckgo, google, json, wikipedia};
use crate::config::{ProviderKind, Settings};
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing providers from configuration
pub struct ProviderLoader;

impl ProviderLoader {
    /// Load adapters for every configured provider.
    ///
    /// Disabled providers are loaded too, so a query override can switch them
    /// on. Providers whose adapter rejects the config are skipped.
    pub fn load(settings: &Settings) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();

        for config in &settings.providers {
            let provider = Self::create_provider(config.kind);
            match provider.validate(config) {
                Ok(()) => {
                    info!("Loaded provider: {} ({})", config.name, config.kind);
                    registry.register(config.name.clone(), provider);
                }
                Err(e) if config.enabled => {
                    warn!("Failed to load provider {}: {}", config.name, e);
                }
                Err(e) => {
                    info!("Skipping disabled provider {}: {}", config.name, e);
                }
            }
        }

        info!("Loaded {} providers", registry.len());
        registry
    }

    /// Create the adapter for a provider kind
    pub fn create_provider(kind: ProviderKind) -> Arc<dyn Provider> {
        match kind {
            ProviderKind::Json => Arc::new(json::JsonApi::new()),
            ProviderKind::Brave => Arc::new(brave::Brave::new()),
            ProviderKind::Bing => Arc::new(bing::Bing::new()),
            ProviderKind::Google => Arc::new(google::Google::new()),
            ProviderKind::Wikipedia => Arc::new(wikipedia::Wikipedia::new()),
            ProviderKind::DuckDuckGo => Arc::new(duckduckgo::DuckDuckGo::new()),
        }
    }

    /// Get list of available provider kinds
    pub fn available_kinds() -> Vec<ProviderKind> {
        vec![
            ProviderKind::Json,
            ProviderKind::Brave,
            ProviderKind::Bing,
            ProviderKind::Google,
            ProviderKind::Wikipedia,
            ProviderKind::DuckDuckGo,
        ]
    }
}
