use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use poolcare_common::RangeConfig;
use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_READINGS_NAMESPACE;
use crate::model::storage::{DEFAULT_CACHE_NAMESPACE, DEFAULT_TTL_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// JSON file backing the key-value store
    #[serde(default = "default_data_file")]
    pub data_file: String,

    #[serde(default = "default_readings_namespace")]
    pub readings_namespace: String,

    #[serde(default = "default_cache_namespace")]
    pub cache_namespace: String,

    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: i64,

    #[serde(default)]
    pub ranges: RangeConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_data_file() -> String {
    "data/poolcare.json".to_string()
}

fn default_readings_namespace() -> String {
    DEFAULT_READINGS_NAMESPACE.to_string()
}

fn default_cache_namespace() -> String {
    DEFAULT_CACHE_NAMESPACE.to_string()
}

fn default_cache_ttl_ms() -> i64 {
    DEFAULT_TTL_MS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            data_file: default_data_file(),
            readings_namespace: default_readings_namespace(),
            cache_namespace: default_cache_namespace(),
            cache_ttl_ms: default_cache_ttl_ms(),
            ranges: RangeConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        if config.readings_namespace == config.cache_namespace {
            anyhow::bail!(
                "readings_namespace and cache_namespace must differ (both '{}')",
                config.readings_namespace
            );
        }
        Ok(config)
    }
}

pub static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Load `path` into [`CONFIG`]; a missing file yields the defaults.
///
/// Returns whether the file was found.
pub fn read_config(path: impl AsRef<Path>) -> anyhow::Result<bool> {
    let path = path.as_ref();
    let (config, found) = if path.exists() {
        (AppConfig::from_file(path)?, true)
    } else {
        (AppConfig::default(), false)
    };

    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Configuration already loaded"))?;

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.readings_namespace, "readings");
        assert_eq!(config.cache_namespace, "cache");
        assert_eq!(config.cache_ttl_ms, 3_600_000);
        assert_eq!(config.ranges, RangeConfig::default());
    }

    #[test]
    fn test_range_override() {
        let config = AppConfig::from_toml(
            r#"
            log_level = "debug"
            data_file = "/tmp/pool.json"

            [ranges.chlorine]
            min = 3.0
            max = 5.0
            ideal = 4.0
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.ranges.chlorine.ideal, 4.0);
        assert_eq!(config.ranges.ph, RangeConfig::default().ph);
    }

    #[test]
    fn test_colliding_namespaces_rejected() {
        let result = AppConfig::from_toml(
            r#"
            readings_namespace = "shared"
            cache_namespace = "shared"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        assert!(AppConfig::from_toml("log_level = ").is_err());
    }
}
