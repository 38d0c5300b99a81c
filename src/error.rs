//! Error types for the aggregation core.
//!
//! Provider-level failures are values, not control flow: they are recorded in a
//! [`ProviderOutcome`](crate::results::ProviderOutcome) and never abort an
//! aggregation call. Configuration errors are reported before any call starts.

use serde::{Deserialize, Serialize};

/// Why a single provider produced no usable results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProviderFailure {
    /// The provider did not answer within its timeout.
    #[error("request timed out")]
    Timeout,

    /// The provider rejected the configured credentials.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The payload could not be translated into results.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The provider asked us to slow down.
    #[error("rate limited")]
    RateLimited,

    /// Connection, TLS or HTTP-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider task itself failed (for example it panicked).
    #[error("provider task failed: {0}")]
    Internal(String),
}

impl ProviderFailure {
    /// Map an HTTP status code onto the failure taxonomy.
    ///
    /// Returns `None` for 2xx statuses.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            401 | 403 => Some(Self::Auth(format!("HTTP {status}"))),
            429 => Some(Self::RateLimited),
            _ => Some(Self::Transport(format!("HTTP {status}"))),
        }
    }
}

/// Invalid or unreadable settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(String),

    #[error("duplicate provider name `{0}`")]
    DuplicateProvider(String),

    #[error("invalid provider `{provider}`: {reason}")]
    InvalidProvider { provider: String, reason: String },

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub fn provider(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProvider {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ProviderFailure::from_status(200), None);
        assert_eq!(ProviderFailure::from_status(204), None);
        assert!(matches!(
            ProviderFailure::from_status(401),
            Some(ProviderFailure::Auth(_))
        ));
        assert!(matches!(
            ProviderFailure::from_status(403),
            Some(ProviderFailure::Auth(_))
        ));
        assert_eq!(
            ProviderFailure::from_status(429),
            Some(ProviderFailure::RateLimited)
        );
        assert_eq!(
            ProviderFailure::from_status(502),
            Some(ProviderFailure::Transport("HTTP 502".to_string()))
        );
    }

    #[test]
    fn failure_serializes_with_kind_tag() {
        let json = serde_json::to_value(ProviderFailure::Auth("HTTP 401".into())).unwrap();
        assert_eq!(json["kind"], "auth");
        assert_eq!(json["detail"], "HTTP 401");

        let json = serde_json::to_value(ProviderFailure::Timeout).unwrap();
        assert_eq!(json["kind"], "timeout");
    }

    #[test]
    fn display_invalid_provider() {
        let err = ConfigError::provider("google", "missing `cx` param");
        assert_eq!(
            err.to_string(),
            "invalid provider `google`: missing `cx` param"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProviderFailure>();
        assert_send_sync::<ConfigError>();
    }
}
