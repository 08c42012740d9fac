//! Particle accumulation for summaries and histograms
//!
//! One accumulator per label set. Both distribution kinds consume the same
//! `{count, sum, particle}` stream; they only differ in how a particle is
//! laid out on the wire.

use super::proto::{self, Bucket, Quantile};

/// Distribution flavour of a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionKind {
    /// Particles are `(quantile, value)` rows
    Summary,
    /// Particles are `(upper bound, cumulative count)` rows
    Histogram,
}

impl DistributionKind {
    /// Synthetic label carrying the particle boundary
    pub fn particle_label(&self) -> &'static str {
        match self {
            DistributionKind::Summary => "quantile",
            DistributionKind::Histogram => "le",
        }
    }
}

/// Typed payload of one output record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPayload {
    Counter(f64),
    Gauge(f64),
    Summary(proto::Summary),
    Histogram(proto::Histogram),
}

impl RecordPayload {
    /// Attach this payload to a metric record, clearing any previous one
    pub fn apply(self, metric: &mut proto::Metric) {
        metric.counter = None;
        metric.gauge = None;
        metric.summary = None;
        metric.histogram = None;
        match self {
            RecordPayload::Counter(value) => {
                metric.counter = Some(proto::Counter { value: Some(value) })
            }
            RecordPayload::Gauge(value) => metric.gauge = Some(proto::Gauge { value: Some(value) }),
            RecordPayload::Summary(summary) => metric.summary = Some(summary),
            RecordPayload::Histogram(histogram) => metric.histogram = Some(histogram),
        }
    }
}

/// Count, sum and particles collected for one label set
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleAccumulator {
    kind: DistributionKind,
    sample_count: Option<u64>,
    sample_sum: Option<f64>,
    /// (boundary, value) in arrival order
    particles: Vec<(f64, f64)>,
}

impl ParticleAccumulator {
    pub fn new(kind: DistributionKind) -> Self {
        ParticleAccumulator {
            kind,
            sample_count: None,
            sample_sum: None,
            particles: Vec::new(),
        }
    }

    /// Record the `_count` row; a later one replaces an earlier one
    pub fn consume_sample_count(&mut self, count: u64) {
        self.sample_count = Some(count);
    }

    /// Record the `_sum` row; a later one replaces an earlier one
    pub fn consume_sample_sum(&mut self, sum: f64) {
        self.sample_sum = Some(sum);
    }

    /// Record one quantile or bucket row
    pub fn consume_particle(&mut self, boundary: f64, value: f64) {
        self.particles.push((boundary, value));
    }

    pub fn sample_count(&self) -> Option<u64> {
        self.sample_count
    }

    pub fn sample_sum(&self) -> Option<f64> {
        self.sample_sum
    }

    pub fn particles(&self) -> &[(f64, f64)] {
        &self.particles
    }

    /// Turn the collected rows into a wire payload
    ///
    /// Particles keep arrival order. For histograms the row value is the
    /// cumulative count and the boundary is the upper bound.
    pub fn finish(self) -> RecordPayload {
        match self.kind {
            DistributionKind::Summary => RecordPayload::Summary(proto::Summary {
                sample_count: self.sample_count,
                sample_sum: self.sample_sum,
                quantile: self
                    .particles
                    .into_iter()
                    .map(|(quantile, value)| Quantile {
                        quantile: Some(quantile),
                        value: Some(value),
                    })
                    .collect(),
            }),
            DistributionKind::Histogram => RecordPayload::Histogram(proto::Histogram {
                sample_count: self.sample_count,
                sample_sum: self.sample_sum,
                bucket: self
                    .particles
                    .into_iter()
                    .map(|(upper_bound, cumulative)| Bucket {
                        cumulative_count: Some(truncate_count(cumulative)),
                        upper_bound: Some(upper_bound),
                    })
                    .collect(),
            }),
        }
    }
}

/// Float sample value to an integral count (saturating, NaN -> 0)
///
/// Negative values become 0 instead of wrapping around on the unsigned wire
/// field the way a plain signed-integer cast would.
pub fn truncate_count(value: f64) -> u64 {
    value as u64
}
