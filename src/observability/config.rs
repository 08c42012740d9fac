//! Logging Configuration
//!
//! Settings are read from environment variables so the embedding service can
//! tune verbosity without code changes.

use tracing_subscriber::EnvFilter;

/// Default filter when `PROM_PROTOBUF_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Logging configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directives (default: info)
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: DEFAULT_LOG_FILTER.to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        LogConfig {
            filter: lookup("PROM_PROTOBUF_LOG")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            json: lookup("PROM_PROTOBUF_LOG_JSON")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Build the filter, falling back to the default on bad directives
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

/// Install a global fmt subscriber
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let builder = tracing_subscriber::fmt().with_env_filter(config.env_filter());
    if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::from_vars(|_| None);
        assert_eq!(config, LogConfig::default());
        assert_eq!(config.filter, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_env_overrides() {
        let config = LogConfig::from_vars(|key| match key {
            "PROM_PROTOBUF_LOG" => Some("prom_protobuf=trace".to_string()),
            "PROM_PROTOBUF_LOG_JSON" => Some("1".to_string()),
            _ => None,
        });
        assert_eq!(config.filter, "prom_protobuf=trace");
        assert!(config.json);
    }

    #[test]
    fn test_bad_filter_falls_back() {
        let config = LogConfig {
            filter: "prom_protobuf=loud".to_string(),
            json: false,
        };
        assert_eq!(config.env_filter().to_string(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_init_twice_fails() {
        let config = LogConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
