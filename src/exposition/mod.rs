//! Protobuf Exposition Module
//!
//! Rebuilds structured `io.prometheus.client` metrics from the flat sample
//! model and writes them as length-delimited protobuf messages:
//!
//! - **Family dispatch** picks a path from the declared family type
//! - **Label-set grouping** buckets distribution rows per series
//! - **Particle accumulation** turns quantile/bucket rows into payloads
//! - **Record emission** labels each record and frames it on the sink

mod accumulator;
pub mod codec;
mod config;
mod emitter;
mod error;
mod float;
mod formatter;
mod grouping;
pub mod proto;

pub use accumulator::{DistributionKind, ParticleAccumulator, RecordPayload};
pub use codec::{decode_families, decode_metrics, DelimitedReader};
pub use config::{Framing, FormatterConfig, CONTENT_TYPE, METRIC_CONTENT_TYPE};
pub use emitter::{FamilyHeader, LabelBuffer, LabelScope, RecordEmitter};
pub use error::{ConfigError, FormatError};
pub use float::decode_label_float;
pub use formatter::{FamilyKind, FormatStats, ProtobufFormatter};
pub use grouping::{Group, LabelGroups, LabelKey};
