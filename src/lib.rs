pub mod exposition;
pub mod metrics;
pub mod observability;

pub use exposition::{
    FormatError, FormatStats, FormatterConfig, Framing, ProtobufFormatter, CONTENT_TYPE,
};
pub use metrics::{MetricFamilySamples, MetricType, Sample};
