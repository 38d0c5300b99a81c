//! Search orchestration module
//!
//! Fans a query out to the enabled providers, collects what arrives within
//! the time budget, then merges and ranks it.

mod dispatcher;
mod models;
mod orchestrator;

pub use dispatcher::{DispatchEntry, DispatchHandle, Dispatcher, ProviderResult};
pub use models::*;
pub use orchestrator::Aggregator;
