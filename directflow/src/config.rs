//! Engine configuration.

use crate::errors::EngineError;
use serde::{Deserialize, Serialize};

/// Configuration for the evaluation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of buffered elements for one key that makes an elements work
    /// item ready.
    #[serde(default = "default_max_bundle_size")]
    pub max_bundle_size: usize,
    /// Maximum number of keys evaluated concurrently.
    #[serde(default = "default_max_concurrent_keys")]
    pub max_concurrent_keys: usize,
    /// Keep every undeclared side-output value for inspection.
    #[serde(default)]
    pub materialize_all_values: bool,
}

fn default_max_bundle_size() -> usize {
    1000
}

fn default_max_concurrent_keys() -> usize {
    16
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_bundle_size: default_max_bundle_size(),
            max_concurrent_keys: default_max_concurrent_keys(),
            materialize_all_values: false,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON, filling in defaults.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if the JSON is malformed or the values
    /// fail validation.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the bundle size.
    #[must_use]
    pub fn with_max_bundle_size(mut self, size: usize) -> Self {
        self.max_bundle_size = size;
        self
    }

    /// Sets the key concurrency.
    #[must_use]
    pub fn with_max_concurrent_keys(mut self, keys: usize) -> Self {
        self.max_concurrent_keys = keys;
        self
    }

    /// Enables or disables materialization of undeclared values.
    #[must_use]
    pub fn with_materialize_all_values(mut self, enabled: bool) -> Self {
        self.materialize_all_values = enabled;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if a limit is zero.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_bundle_size == 0 {
            return Err(EngineError::Config("max_bundle_size must be at least 1".to_string()));
        }
        if self.max_concurrent_keys == 0 {
            return Err(EngineError::Config(
                "max_concurrent_keys must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_bundle_size, 1000);
        assert_eq!(config.max_concurrent_keys, 16);
        assert!(!config.materialize_all_values);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{"max_bundle_size": 3}"#).unwrap();
        assert_eq!(config.max_bundle_size, 3);
        assert_eq!(config.max_concurrent_keys, 16);
    }

    #[test]
    fn test_from_json_rejects_zero() {
        let err = EngineConfig::from_json(r#"{"max_concurrent_keys": 0}"#).unwrap_err();
        assert!(err.to_string().contains("max_concurrent_keys"));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(EngineConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_max_bundle_size(10)
            .with_max_concurrent_keys(2)
            .with_materialize_all_values(true);
        assert_eq!(config.max_bundle_size, 10);
        assert!(config.materialize_all_values);
    }
}
