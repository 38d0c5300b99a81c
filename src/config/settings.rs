//! Settings structures for EasySearch configuration

use crate::error::ConfigError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `EASYSEARCH__SEARCH__GLOBAL_TIMEOUT=3`
pub const ENV_PREFIX: &str = "EASYSEARCH";

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub ranking: RankingSettings,
    pub outgoing: OutgoingSettings,
    pub cache: CacheSettings,
    pub providers: Vec<ProviderConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            search: SearchSettings::default(),
            ranking: RankingSettings::default(),
            outgoing: OutgoingSettings::default(),
            cache: CacheSettings::default(),
            providers: default_providers(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML (or JSON) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Layered load: defaults, then the optional file, then `EASYSEARCH__*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check values the aggregation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("search.global_timeout", self.search.global_timeout)?;
        positive("search.provider_timeout", self.search.provider_timeout)?;
        positive("search.max_provider_timeout", self.search.max_provider_timeout)?;
        if self.search.max_results == Some(0) {
            return Err(ConfigError::Invalid {
                key: "search.max_results",
                reason: "must be greater than zero".to_string(),
            });
        }
        positive_or_zero("ranking.whitelist_bonus", self.ranking.whitelist_bonus)?;
        positive_or_zero("ranking.authority_bonus", self.ranking.authority_bonus)?;
        positive_or_zero("ranking.term_match_weight", self.ranking.term_match_weight)?;

        let mut seen = HashSet::new();
        for provider in &self.providers {
            provider.validate()?;
            if !seen.insert(provider.name.as_str()) {
                return Err(ConfigError::DuplicateProvider(provider.name.clone()));
            }
        }
        Ok(())
    }

    /// Get provider config by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Get all enabled providers
    pub fn enabled_providers(&self) -> Vec<&ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled).collect()
    }

    pub fn global_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.search.global_timeout)
    }
}

fn positive(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}

fn positive_or_zero(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("must not be negative, got {value}"),
        })
    }
}

/// General settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Wall-clock budget for one aggregation call, in seconds
    pub global_timeout: f64,
    /// Default per-provider timeout in seconds
    pub provider_timeout: f64,
    /// Upper bound for any per-provider timeout
    pub max_provider_timeout: f64,
    /// Default cap on returned records (a query limit takes precedence)
    pub max_results: Option<usize>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            global_timeout: 8.0,
            provider_timeout: 5.0,
            max_provider_timeout: 30.0,
            max_results: None,
        }
    }
}

/// Ranking signals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
    /// Domains whose results are removed
    pub blacklist: Vec<String>,
    /// Domains whose results are preferred
    pub whitelist: Vec<String>,
    /// Domains treated as authoritative sources
    pub authoritative_sites: Vec<String>,
    /// Added to the site factor for whitelisted hosts
    pub whitelist_bonus: f64,
    /// Added to the site factor for authoritative hosts
    pub authority_bonus: f64,
    /// Strength of the query-term match signal
    pub term_match_weight: f64,
    /// Favor recently published results
    pub freshness: bool,
    /// Query parameter names stripped before deduplication
    pub tracking_params: Vec<String>,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            blacklist: vec!["csdn.net".to_string()],
            whitelist: vec![],
            authoritative_sites: vec!["github.com".to_string(), "stackoverflow.com".to_string()],
            whitelist_bonus: 1.5,
            authority_bonus: 1.0,
            term_match_weight: 0.25,
            freshness: true,
            tracking_params: crate::results::url::DEFAULT_TRACKING_PARAMS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Transport-level request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Fixed user agent (none = random browser-like)
    pub user_agent: Option<String>,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 20.0,
            pool_maxsize: 20,
            verify_ssl: true,
            user_agent: None,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Aggregation result cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_seconds: 300,
            max_capacity: 1000,
        }
    }
}

/// Which adapter parses a provider's responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Any JSON API, described by an endpoint template and field mapping
    #[default]
    Json,
    Brave,
    Bing,
    Google,
    Wikipedia,
    #[serde(rename = "duckduckgo", alias = "ddg")]
    DuckDuckGo,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Brave => "brave",
            Self::Bing => "bing",
            Self::Google => "google",
            Self::Wikipedia => "wikipedia",
            Self::DuckDuckGo => "duckduckgo",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON field names used by the generic JSON adapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Dotted path to the result list, e.g. `data.items`
    pub results_path: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
    pub published: Option<String>,
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name (unique identifier)
    pub name: String,
    /// Adapter to use
    pub kind: ProviderKind,
    /// Trust multiplier for ranking
    #[serde(alias = "weight")]
    pub trust: f64,
    /// Whether the provider is queried by default
    pub enabled: bool,
    /// Custom timeout for this provider in seconds
    pub timeout: Option<f64>,
    /// Endpoint or endpoint template
    #[serde(alias = "api_url")]
    pub endpoint: Option<String>,
    /// API key if required
    pub api_key: Option<String>,
    /// Header carrying the API key, when the provider expects one
    #[serde(alias = "json_keyheader")]
    pub key_header: Option<String>,
    /// Extra query parameters sent with every request
    pub params: BTreeMap<String, String>,
    /// Field mapping for JSON responses
    pub mapping: FieldMapping,
    /// Number of results to request, where the API accepts it
    pub max_results: Option<u32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: ProviderKind::default(),
            trust: 1.0,
            enabled: true,
            timeout: None,
            endpoint: None,
            api_key: None,
            key_header: None,
            params: BTreeMap::new(),
            mapping: FieldMapping::default(),
            max_results: None,
        }
    }
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn with_trust(mut self, trust: f64) -> Self {
        self.trust = trust;
        self
    }

    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Checks that do not depend on the adapter
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::provider("<unnamed>", "name must not be empty"));
        }
        if !(self.trust.is_finite() && self.trust > 0.0) {
            return Err(ConfigError::provider(
                &self.name,
                format!("trust must be a positive number, got {}", self.trust),
            ));
        }
        if let Some(timeout) = self.timeout {
            if !(timeout.is_finite() && timeout > 0.0) {
                return Err(ConfigError::provider(
                    &self.name,
                    format!("timeout must be a positive number, got {timeout}"),
                ));
            }
        }
        if self.enabled {
            match self.kind {
                ProviderKind::Json if self.endpoint.as_deref().map_or(true, str::is_empty) => {
                    return Err(ConfigError::provider(&self.name, "json providers need an endpoint"));
                }
                ProviderKind::Google if !self.params.contains_key("cx") => {
                    return Err(ConfigError::provider(&self.name, "google needs a `cx` param"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Default provider configurations.
///
/// Keyless providers are enabled; API-key providers ship disabled.
fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new("duckduckgo", ProviderKind::DuckDuckGo),
        ProviderConfig::new("wikipedia", ProviderKind::Wikipedia),
        ProviderConfig::new("google", ProviderKind::Google)
            .with_trust(1.2)
            .disabled(),
        ProviderConfig::new("brave", ProviderKind::Brave).disabled(),
        ProviderConfig::new("bing", ProviderKind::Bing)
            .with_trust(0.8)
            .disabled(),
    ]
}
