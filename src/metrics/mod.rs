//! Input model
//!
//! The flat sample stream produced by a registry, one family at a time.

mod types;

pub use types::{MetricFamilySamples, MetricType, Sample};
