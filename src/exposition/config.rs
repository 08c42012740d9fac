//! Formatter configuration
//!
//! Loaded from a TOML document or from `PROM_PROTOBUF_*` environment
//! variables. Every field has a default, so an empty document is valid.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::ConfigError;

/// Content type of a stream of length-delimited `MetricFamily` messages
pub const CONTENT_TYPE: &str =
    "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=delimited";

/// Content type of a stream of length-delimited `Metric` messages
pub const METRIC_CONTENT_TYPE: &str =
    "application/vnd.google.protobuf; proto=io.prometheus.client.Metric; encoding=delimited";

/// What one length-delimited message on the sink holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// One `MetricFamily` per family, records embedded
    #[default]
    Family,
    /// One `Metric` per record
    Metric,
}

impl Framing {
    pub fn content_type(&self) -> &'static str {
        match self {
            Framing::Family => CONTENT_TYPE,
            Framing::Metric => METRIC_CONTENT_TYPE,
        }
    }

    pub fn parse(s: &str) -> Option<Framing> {
        match s.trim().to_ascii_lowercase().as_str() {
            "family" => Some(Framing::Family),
            "metric" => Some(Framing::Metric),
            _ => None,
        }
    }
}

/// Configuration of a `ProtobufFormatter`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Message framing on the sink (default: family)
    pub framing: Framing,
    /// Label pairs placed in front of every record's own labels
    pub const_labels: Vec<(String, String)>,
    /// Family names to write; empty writes every family
    pub include_names: Vec<String>,
}

impl FormatterConfig {
    /// Parse configuration from a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// - `PROM_PROTOBUF_FRAMING`: `family` or `metric`
    /// - `PROM_PROTOBUF_CONST_LABELS`: `name:value,name2:value2`
    /// - `PROM_PROTOBUF_INCLUDE`: `family_a,family_b`
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let framing = match lookup("PROM_PROTOBUF_FRAMING") {
            Some(raw) => Framing::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "unknown PROM_PROTOBUF_FRAMING, using family framing");
                Framing::default()
            }),
            None => Framing::default(),
        };

        FormatterConfig {
            framing,
            const_labels: lookup("PROM_PROTOBUF_CONST_LABELS")
                .map(|raw| parse_label_pairs(&raw))
                .unwrap_or_default(),
            include_names: lookup("PROM_PROTOBUF_INCLUDE")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Whether a family passes the `include_names` filter
    pub fn includes(&self, family: &str) -> bool {
        self.include_names.is_empty() || self.include_names.iter().any(|n| n == family)
    }
}

/// Parse `name:value,name2:value2`, dropping malformed entries
fn parse_label_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, ':');
            let name = parts.next()?.trim();
            let value = parts.next()?.trim();
            if name.is_empty() {
                warn!(pair, "ignoring const label without a name");
                None
            } else {
                Some((name.to_string(), value.to_string()))
            }
        })
        .collect()
}
