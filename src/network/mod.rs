//! HTTP networking module
//!
//! Providers describe requests; a [`Transport`] executes them. The default
//! transport is [`HttpClient`]; tests substitute in-memory ones.

mod client;
mod user_agent;

pub use client::HttpClient;
pub use user_agent::generate_user_agent;

use crate::error::ProviderFailure;
use crate::providers::{ProviderRequest, ProviderResponse};
use async_trait::async_trait;

/// Executes provider requests.
///
/// Non-2xx responses are returned as responses; only failures to obtain a
/// response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderFailure>;
}
