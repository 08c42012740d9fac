//! Family dispatch and the public write path
//!
//! Counters and gauges map one sample to one record. Summaries and
//! histograms go through label-set grouping first. Any other family type is
//! skipped without error.

use std::borrow::Borrow;
use std::io::Write;

use tracing::debug;

use super::accumulator::{DistributionKind, RecordPayload};
use super::config::FormatterConfig;
use super::emitter::{FamilyHeader, LabelBuffer, RecordEmitter};
use super::error::{ensure_paired, FormatError};
use super::grouping::LabelGroups;
use super::proto;
use crate::metrics::{MetricFamilySamples, MetricType};

/// Reconstruction path chosen for a family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyKind {
    /// Every sample is its own record
    Counter,
    /// Every sample is its own record
    Gauge,
    /// Samples are grouped by label set and accumulated
    Distribution(DistributionKind),
}

impl FamilyKind {
    /// Path for a declared family type, `None` for types not written
    pub fn of(metric_type: MetricType) -> Option<FamilyKind> {
        match metric_type {
            MetricType::Counter => Some(FamilyKind::Counter),
            MetricType::Gauge => Some(FamilyKind::Gauge),
            MetricType::Summary => Some(FamilyKind::Distribution(DistributionKind::Summary)),
            MetricType::Histogram => Some(FamilyKind::Distribution(DistributionKind::Histogram)),
            MetricType::Untyped
            | MetricType::Info
            | MetricType::StateSet
            | MetricType::GaugeHistogram => None,
        }
    }

    /// Wire type of the family message
    pub fn wire_type(&self) -> proto::MetricType {
        match self {
            FamilyKind::Counter => proto::MetricType::Counter,
            FamilyKind::Gauge => proto::MetricType::Gauge,
            FamilyKind::Distribution(DistributionKind::Summary) => proto::MetricType::Summary,
            FamilyKind::Distribution(DistributionKind::Histogram) => proto::MetricType::Histogram,
        }
    }
}

/// Totals of one `write` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatStats {
    /// Families that produced at least one record
    pub families_written: usize,
    /// Families filtered out, of a type that is not written, or left with
    /// no records (empty, or every row dropped)
    pub families_skipped: usize,
    pub records_written: usize,
}

/// Converts flat metric families into length-delimited protobuf messages
#[derive(Debug, Clone, Default)]
pub struct ProtobufFormatter {
    config: FormatterConfig,
}

impl ProtobufFormatter {
    pub fn new(config: FormatterConfig) -> Self {
        ProtobufFormatter { config }
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Media type of the stream `write` produces
    pub fn content_type(&self) -> &'static str {
        self.config.framing.content_type()
    }

    /// Write every family, in order, to `sink`
    ///
    /// Stops at the first fatal error. Families written before it stay in
    /// the sink.
    pub fn write<I, W>(&self, families: I, sink: &mut W) -> Result<FormatStats, FormatError>
    where
        I: IntoIterator,
        I::Item: Borrow<MetricFamilySamples>,
        W: Write,
    {
        let mut stats = FormatStats::default();
        let mut labels = LabelBuffer::with_const_labels(&self.config.const_labels);

        for family in families {
            let family = family.borrow();
            if !self.config.includes(&family.name) {
                debug!(family = %family.name, "family filtered out");
                stats.families_skipped += 1;
                continue;
            }
            let Some(kind) = FamilyKind::of(family.metric_type) else {
                debug!(
                    family = %family.name,
                    metric_type = family.metric_type.as_str(),
                    "skipping family of unsupported type"
                );
                stats.families_skipped += 1;
                continue;
            };

            let (records, returned) = self.write_family_with(family, kind, labels, sink)?;
            labels = returned;
            if records > 0 {
                stats.families_written += 1;
                stats.records_written += records;
            } else {
                debug!(family = %family.name, "family produced no records");
                stats.families_skipped += 1;
            }
        }

        Ok(stats)
    }

    /// Write a single family, returning the number of records emitted
    ///
    /// Unsupported family types and filtered names emit nothing.
    pub fn write_family<W: Write>(
        &self,
        family: &MetricFamilySamples,
        sink: &mut W,
    ) -> Result<usize, FormatError> {
        let stats = self.write(std::iter::once(family), sink)?;
        Ok(stats.records_written)
    }

    fn write_family_with<W: Write>(
        &self,
        family: &MetricFamilySamples,
        kind: FamilyKind,
        labels: LabelBuffer,
        sink: &mut W,
    ) -> Result<(usize, LabelBuffer), FormatError> {
        let mut emitter = RecordEmitter::new(sink, self.config.framing, labels);

        match kind {
            FamilyKind::Counter | FamilyKind::Gauge => {
                for sample in &family.samples {
                    ensure_paired(&family.name, sample)?;
                }
                for sample in &family.samples {
                    let payload = match kind {
                        FamilyKind::Counter => RecordPayload::Counter(sample.value),
                        _ => RecordPayload::Gauge(sample.value),
                    };
                    emitter.emit(&sample.label_names, &sample.label_values, payload)?;
                }
            }
            FamilyKind::Distribution(distribution) => {
                let groups = LabelGroups::collect(family, distribution)?;
                if groups.skipped() > 0 {
                    debug!(
                        family = %family.name,
                        skipped = groups.skipped(),
                        "dropped rows without particle label"
                    );
                }
                for group in groups.into_groups() {
                    emitter.emit(
                        group.key.names(),
                        group.key.values(),
                        group.accumulator.finish(),
                    )?;
                }
            }
        }

        let records = emitter.records();
        let labels = emitter.finish(FamilyHeader {
            name: &family.name,
            help: &family.help,
            metric_type: kind.wire_type(),
        })?;
        if records > 0 {
            debug!(family = %family.name, records, "family written");
        }
        Ok((records, labels))
    }
}
