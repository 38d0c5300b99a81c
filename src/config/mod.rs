//! Configuration module for EasySearch
//!
//! Handles loading and validating settings from YAML/JSON files and
//! environment variables. Settings are passed explicitly into the
//! aggregation; nothing here is global.

mod settings;

pub use settings::*;

use crate::error::ConfigError;
use std::path::PathBuf;
use tracing::info;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "EASYSEARCH_SETTINGS_PATH";

/// Find the settings file to use, if any
pub fn locate_settings_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(SETTINGS_PATH_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let mut candidates = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("easysearch/settings.yml"));
    }

    candidates.into_iter().find(|p| p.exists())
}

/// Load settings from `path`, or from the first file found, or defaults
pub fn load(path: Option<PathBuf>) -> Result<Settings, ConfigError> {
    match path.or_else(locate_settings_file) {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::load(Some(&path))
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::load(None)
        }
    }
}
