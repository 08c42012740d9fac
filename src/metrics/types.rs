//! Flat exposition model handed over by a metrics registry
//!
//! One `MetricFamilySamples` per metric family and collection cycle. Every
//! row of a distribution (`_count`, `_sum`, one row per quantile or bucket)
//! is an ordinary `Sample`; the particle rows carry one extra synthetic
//! label (`quantile` or `le`).

use serde::{Deserialize, Serialize};

/// Declared type of a metric family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Monotonically increasing value, one sample per series
    Counter,

    /// Point-in-time value, one sample per series
    Gauge,

    /// Client-side quantiles plus `_count` and `_sum`
    Summary,

    /// Cumulative buckets plus `_count` and `_sum`
    Histogram,

    /// Untyped value (not written by the protobuf formatter)
    Untyped,

    /// Info metric (not written by the protobuf formatter)
    Info,

    /// State set (not written by the protobuf formatter)
    StateSet,

    /// Gauge histogram (not written by the protobuf formatter)
    GaugeHistogram,
}

impl MetricType {
    /// Name used in the text exposition format
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Summary => "summary",
            MetricType::Histogram => "histogram",
            MetricType::Untyped => "untyped",
            MetricType::Info => "info",
            MetricType::StateSet => "stateset",
            MetricType::GaugeHistogram => "gaugehistogram",
        }
    }
}

/// A single flat, label-tagged observation
///
/// `label_names` and `label_values` pair up positionally and always have the
/// same length. Their order is significant for grouping. Deserialization
/// rejects input where they do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSample")]
pub struct Sample {
    /// Sample name, e.g. `http_latency_seconds_bucket`
    pub name: String,

    /// Label names, positionally paired with `label_values`
    pub label_names: Vec<String>,

    /// Label values, positionally paired with `label_names`
    pub label_values: Vec<String>,

    /// The observed value
    pub value: f64,
}

impl Sample {
    /// Create a sample from parallel name/value lists
    ///
    /// Panics if the two lists differ in length.
    pub fn new(
        name: impl Into<String>,
        label_names: Vec<String>,
        label_values: Vec<String>,
        value: f64,
    ) -> Self {
        assert_eq!(
            label_names.len(),
            label_values.len(),
            "label names and values must pair up"
        );
        Sample {
            name: name.into(),
            label_names,
            label_values,
            value,
        }
    }

    /// Create a sample from a slice of (name, value) tuples, keeping their order
    pub fn from_pairs(name: impl Into<String>, pairs: &[(&str, &str)], value: f64) -> Self {
        let (label_names, label_values) = pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .unzip();
        Sample {
            name: name.into(),
            label_names,
            label_values,
            value,
        }
    }

    /// Get a label value by name (first match)
    pub fn label(&self, name: &str) -> Option<&str> {
        self.label_names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }

    /// Whether every label name has a value and vice versa
    pub fn is_paired(&self) -> bool {
        self.label_names.len() == self.label_values.len()
    }

    /// Iterate (name, value) pairs in positional order
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.label_names
            .iter()
            .zip(&self.label_values)
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Wire shape of a `Sample` before the pairing check
#[derive(Deserialize)]
struct RawSample {
    name: String,
    label_names: Vec<String>,
    label_values: Vec<String>,
    value: f64,
}

impl TryFrom<RawSample> for Sample {
    type Error = String;

    fn try_from(raw: RawSample) -> Result<Self, Self::Error> {
        if raw.label_names.len() != raw.label_values.len() {
            return Err(format!(
                "sample {}: {} label names but {} label values",
                raw.name,
                raw.label_names.len(),
                raw.label_values.len()
            ));
        }
        Ok(Sample {
            name: raw.name,
            label_names: raw.label_names,
            label_values: raw.label_values,
            value: raw.value,
        })
    }
}

/// All samples of one metric family for one collection cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFamilySamples {
    /// Family name (without `_count`/`_sum`/`_bucket` suffixes)
    pub name: String,

    /// Declared type
    #[serde(rename = "type")]
    pub metric_type: MetricType,

    /// Help text
    #[serde(default)]
    pub help: String,

    /// Flat samples in registry order
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl MetricFamilySamples {
    /// Create an empty family
    pub fn new(name: impl Into<String>, metric_type: MetricType, help: impl Into<String>) -> Self {
        MetricFamilySamples {
            name: name.into(),
            metric_type,
            help: help.into(),
            samples: Vec::new(),
        }
    }

    /// Append a sample
    pub fn with_sample(mut self, sample: Sample) -> Self {
        self.samples.push(sample);
        self
    }

    /// Append a sample built from (name, value) label tuples
    pub fn push(&mut self, name: impl Into<String>, pairs: &[(&str, &str)], value: f64) {
        self.samples.push(Sample::from_pairs(name, pairs, value));
    }
}
