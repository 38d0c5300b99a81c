//! Search provider module
//!
//! Defines the Provider trait, the adapters for each supported kind of search
//! API and a registry resolving configured providers to adapters.

mod loader;
mod registry;
mod traits;

// Provider implementations
pub mod bing;
pub mod brave;
pub mod duckduckgo;
pub mod google;
pub mod json;
pub mod wikipedia;

pub use loader::ProviderLoader;
pub use registry::ProviderRegistry;
pub use traits::*;
