use anyhow::{Context, Result};
use serde::Deserialize;
use validator::Validate;

// Default constants
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1000;

pub const DEFAULT_TELEMETRY_ENABLED: bool = false;
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";
pub const DEFAULT_SERVICE_NAME: &str = "fedgate";

/// Top-level gateway configuration.
///
/// Loaded from an optional file plus `FEDGATE__`-prefixed environment
/// variables (e.g. `FEDGATE__CACHE__TTL_SECONDS` maps to `cache.ttl_seconds`).
#[derive(Debug, Deserialize, Default, Clone, Validate)]
pub struct GatewayConfig {
    #[serde(default)]
    pub cache: FragmentCacheConfig,
    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

/// Bounds for the fragment listing cache.
///
/// Eviction policy internals are the cache library's concern; only the
/// lifetime and entry bounds are configurable.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct FragmentCacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: u64,
}

impl Default for FragmentCacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            max_entries: default_cache_max_entries(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECONDS
}

fn default_cache_max_entries() -> u64 {
    DEFAULT_CACHE_MAX_ENTRIES
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_otlp_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            endpoint: default_otlp_endpoint(),
            service_name: default_service_name(),
        }
    }
}

fn default_telemetry_enabled() -> bool {
    DEFAULT_TELEMETRY_ENABLED
}

fn default_otlp_endpoint() -> String {
    DEFAULT_OTLP_ENDPOINT.to_string()
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

impl GatewayConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let builder = config::Config::builder();

        let builder = if std::path::Path::new(path).exists() {
            builder.add_source(config::File::with_name(path))
        } else {
            builder
        };

        // Map FEDGATE__CACHE__TTL_SECONDS to cache.ttl_seconds, etc.
        let builder = builder.add_source(
            config::Environment::with_prefix("FEDGATE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build().context("Failed to build configuration")?;

        let gateway_config: GatewayConfig = cfg
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        gateway_config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration validation failed: {:?}", e))?;

        Ok(gateway_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; tests that read or write
    // them must not interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_gateway_config_validation() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl_seconds, DEFAULT_CACHE_TTL_SECONDS);
        assert_eq!(config.cache.max_entries, DEFAULT_CACHE_MAX_ENTRIES);
    }

    #[test]
    fn test_telemetry_config_validation() {
        let config = TelemetryConfig {
            endpoint: "not_a_url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let config = GatewayConfig::from_file("/nonexistent/fedgate.yaml").unwrap();
        assert_eq!(config.cache.ttl_seconds, DEFAULT_CACHE_TTL_SECONDS);
        assert!(!config.telemetry.enabled);
    }

    #[test]
    fn test_env_variables_override_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("FEDGATE__CACHE__TTL_SECONDS", "120");
        std::env::set_var("FEDGATE__TELEMETRY__SERVICE_NAME", "fedgate-staging");

        let config = GatewayConfig::from_file("/nonexistent/fedgate.yaml");

        std::env::remove_var("FEDGATE__CACHE__TTL_SECONDS");
        std::env::remove_var("FEDGATE__TELEMETRY__SERVICE_NAME");

        let config = config.unwrap();
        assert_eq!(config.cache.ttl_seconds, 120);
        assert_eq!(config.telemetry.service_name, "fedgate-staging");
        // Untouched settings keep their defaults.
        assert_eq!(config.cache.max_entries, DEFAULT_CACHE_MAX_ENTRIES);
    }
}
