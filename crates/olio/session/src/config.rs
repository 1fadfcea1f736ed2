//! Hydration configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Key under which the bootstrap record is persisted.
pub const DEFAULT_CACHE_KEY: &str = "olio.bootstrap";

/// Configuration for the hydration core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrationConfig {
    /// Persisted key-value key holding the bootstrap record.
    pub cache_key: String,

    /// Buffer size of the auth event broadcast channel.
    pub event_capacity: usize,

    /// Attempts at drawing an unused join code when creating an organization.
    pub join_code_attempts: u32,

    /// Use the organization hint in identity metadata when the membership
    /// lookup fails.
    pub identity_hint_fallback: bool,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            event_capacity: 64,
            join_code_attempts: 20,
            identity_hint_fallback: false,
        }
    }
}

impl HydrationConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from a TOML file. A missing file yields the default config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HydrationConfig::default();
        assert_eq!(config.cache_key, DEFAULT_CACHE_KEY);
        assert_eq!(config.join_code_attempts, 20);
        assert!(!config.identity_hint_fallback);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = HydrationConfig::from_toml_str("identity_hint_fallback = true\n").unwrap();
        assert!(config.identity_hint_fallback);
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = HydrationConfig::from_toml_str("event_capacity = \"lots\"").unwrap_err();
        assert!(err.to_string().starts_with("config error"));
    }

    #[test]
    fn test_load_missing_file() {
        let config = HydrationConfig::load("/nonexistent/olio/config.toml").unwrap();
        assert_eq!(config, HydrationConfig::default());
    }
}
