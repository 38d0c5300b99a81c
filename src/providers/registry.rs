//! Provider registry for resolving configured providers to adapters

use super::loader::ProviderLoader;
use super::traits::Provider;
use crate::config::ProviderConfig;
use crate::error::ProviderFailure;
use std::collections::HashMap;
use std::sync::Arc;

/// Adapters for configured providers, by provider name
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under a provider name
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the adapter registered for `name`
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.get(name)
    }

    /// Adapter for a provider config.
    ///
    /// Providers not registered by name (for example ones enabled only by a
    /// query override) get a fresh adapter for their kind, which must accept
    /// the config.
    pub fn resolve(&self, config: &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderFailure> {
        if let Some(provider) = self.providers.get(&config.name) {
            return Ok(Arc::clone(provider));
        }
        let provider = ProviderLoader::create_provider(config.kind);
        provider
            .validate(config)
            .map_err(|e| ProviderFailure::Internal(e.to_string()))?;
        Ok(provider)
    }

    /// Get all provider names
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a provider is registered
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Get number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::providers::wikipedia::Wikipedia;

    #[test]
    fn test_registry() {
        let mut registry = ProviderRegistry::new();
        registry.register("wiki", Arc::new(Wikipedia::new()));

        assert!(registry.contains("wiki"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("wiki").unwrap().kind(), ProviderKind::Wikipedia);
    }

    #[test]
    fn test_resolve_falls_back_to_kind() {
        let registry = ProviderRegistry::new();

        let wiki = ProviderConfig::new("wiki", ProviderKind::Wikipedia);
        assert_eq!(registry.resolve(&wiki).unwrap().kind(), ProviderKind::Wikipedia);

        // Rejected configs surface as a provider failure, not a panic
        let brave = ProviderConfig::new("brave", ProviderKind::Brave);
        assert!(matches!(
            registry.resolve(&brave),
            Err(ProviderFailure::Internal(_))
        ));
    }
}
