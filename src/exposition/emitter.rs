//! Record emission
//!
//! A family's records are built against one reusable label buffer. Each
//! record pushes its own pairs on top of whatever the buffer already holds
//! (the configured constant labels), is encoded, and the pushed pairs are
//! rolled back before the next record. `LabelScope` performs the rollback on
//! drop so an early return cannot leak labels into the next record.

use std::io::Write;

use bytes::BytesMut;
use prost::Message;

use super::accumulator::RecordPayload;
use super::config::Framing;
use super::error::FormatError;
use super::proto::{self, LabelPair, Metric};

/// Label pairs shared by every record of a family
#[derive(Debug, Clone, Default)]
pub struct LabelBuffer {
    pairs: Vec<LabelPair>,
}

impl LabelBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer preloaded with pairs that every record carries first
    pub fn with_const_labels(const_labels: &[(String, String)]) -> Self {
        LabelBuffer {
            pairs: const_labels
                .iter()
                .map(|(name, value)| LabelPair::new(name.as_str(), value.as_str()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[LabelPair] {
        &self.pairs
    }

    /// Push positional name/value pairs; they are removed when the scope drops
    pub fn push_scope<'a>(&'a mut self, names: &[String], values: &[String]) -> LabelScope<'a> {
        debug_assert_eq!(names.len(), values.len());
        let mark = self.pairs.len();
        self.pairs.extend(
            names
                .iter()
                .zip(values)
                .map(|(name, value)| LabelPair::new(name.as_str(), value.as_str())),
        );
        LabelScope { buffer: self, mark }
    }
}

/// Pairs pushed for one record, truncated back to the mark on drop
pub struct LabelScope<'a> {
    buffer: &'a mut LabelBuffer,
    mark: usize,
}

impl LabelScope<'_> {
    /// Labels the record will carry, constant labels first
    pub fn pairs(&self) -> &[LabelPair] {
        &self.buffer.pairs
    }

    /// Build a record over the buffered labels and hand it to `f`
    ///
    /// The buffer is lent to the record rather than copied and is returned
    /// to the scope afterwards.
    pub fn record<R>(&mut self, payload: RecordPayload, f: impl FnOnce(&Metric) -> R) -> R {
        let mut metric = Metric {
            label: std::mem::take(&mut self.buffer.pairs),
            ..Default::default()
        };
        payload.apply(&mut metric);
        let out = f(&metric);
        self.buffer.pairs = metric.label;
        out
    }
}

impl Drop for LabelScope<'_> {
    fn drop(&mut self) {
        self.buffer.pairs.truncate(self.mark);
    }
}

/// Family-level fields written in front of the records in `Family` framing
#[derive(Debug, Clone, Copy)]
pub struct FamilyHeader<'a> {
    pub name: &'a str,
    pub help: &'a str,
    pub metric_type: proto::MetricType,
}

/// Writes the records of one family to a sink
pub struct RecordEmitter<'s, W: Write> {
    sink: &'s mut W,
    framing: Framing,
    labels: LabelBuffer,
    /// Encoded `MetricFamily.metric` entries (`Family` framing)
    body: BytesMut,
    /// Scratch for one length-delimited frame
    frame: BytesMut,
    records: usize,
}

impl<'s, W: Write> RecordEmitter<'s, W> {
    pub fn new(sink: &'s mut W, framing: Framing, labels: LabelBuffer) -> Self {
        RecordEmitter {
            sink,
            framing,
            labels,
            body: BytesMut::new(),
            frame: BytesMut::new(),
            records: 0,
        }
    }

    /// Build one record from a label set and payload and serialize it
    pub fn emit(
        &mut self,
        names: &[String],
        values: &[String],
        payload: RecordPayload,
    ) -> Result<(), FormatError> {
        let mark = self.labels.len();
        let encoded = {
            let mut scope = self.labels.push_scope(names, values);
            match self.framing {
                Framing::Family => {
                    let body = &mut self.body;
                    scope.record(payload, |metric| {
                        prost::encoding::message::encode(
                            proto::METRIC_FAMILY_METRIC_TAG,
                            metric,
                            body,
                        )
                    });
                    Ok(())
                }
                Framing::Metric => {
                    let frame = &mut self.frame;
                    scope.record(payload, |metric| metric.encode_length_delimited(frame))
                }
            }
        };
        debug_assert_eq!(self.labels.len(), mark);
        encoded?;

        if self.framing == Framing::Metric {
            let written = self.sink.write_all(&self.frame);
            self.frame.clear();
            written?;
        }
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn labels(&self) -> &LabelBuffer {
        &self.labels
    }

    /// Flush the family frame (`Family` framing) and hand back the label buffer
    ///
    /// Nothing is written for a family without records.
    pub fn finish(mut self, header: FamilyHeader<'_>) -> Result<LabelBuffer, FormatError> {
        if self.framing == Framing::Family && self.records > 0 {
            let family = proto::MetricFamily {
                name: Some(header.name.to_string()),
                help: Some(header.help.to_string()),
                r#type: Some(header.metric_type as i32),
                metric: Vec::new(),
            };
            let len = family.encoded_len() + self.body.len();
            self.frame.reserve(prost::length_delimiter_len(len) + len);
            prost::encoding::encode_varint(len as u64, &mut self.frame);
            family.encode(&mut self.frame)?;
            self.frame.extend_from_slice(&self.body);
            self.sink.write_all(&self.frame)?;
        }
        Ok(self.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposition::codec::{decode_families, decode_metrics};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scope_rolls_back_on_drop() {
        let mut buffer = LabelBuffer::with_const_labels(&[("env".to_string(), "prod".to_string())]);
        {
            let scope = buffer.push_scope(&strings(&["a", "b"]), &strings(&["1", "2"]));
            assert_eq!(scope.pairs().len(), 3);
            assert_eq!(scope.pairs()[0], LabelPair::new("env", "prod"));
            assert_eq!(scope.pairs()[2], LabelPair::new("b", "2"));
        }
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_scope_rolls_back_on_error_path() {
        fn failing(buffer: &mut LabelBuffer) -> Result<(), FormatError> {
            let _scope = buffer.push_scope(&strings(&["a"]), &strings(&["1"]));
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom").into())
        }

        let mut buffer = LabelBuffer::new();
        assert!(failing(&mut buffer).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_record_borrows_and_returns_buffer() {
        let mut buffer = LabelBuffer::new();
        let mut scope = buffer.push_scope(&strings(&["x"]), &strings(&["y"]));
        let labels = scope.record(RecordPayload::Counter(42.0), |metric| {
            assert_eq!(metric.counter, Some(proto::Counter { value: Some(42.0) }));
            metric.label.clone()
        });
        assert_eq!(labels, vec![LabelPair::new("x", "y")]);
        assert_eq!(scope.pairs().len(), 1);
        drop(scope);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_metric_framing_writes_each_record() {
        let mut sink = Vec::new();
        let mut emitter = RecordEmitter::new(&mut sink, Framing::Metric, LabelBuffer::new());
        emitter
            .emit(&strings(&["x"]), &strings(&["1"]), RecordPayload::Gauge(1.0))
            .unwrap();
        emitter
            .emit(&strings(&["x"]), &strings(&["2"]), RecordPayload::Gauge(2.0))
            .unwrap();
        assert_eq!(emitter.records(), 2);
        let header = FamilyHeader {
            name: "g",
            help: "",
            metric_type: proto::MetricType::Gauge,
        };
        let labels = emitter.finish(header).unwrap();
        assert!(labels.is_empty());

        let metrics = decode_metrics(sink.into()).unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[1].label, vec![LabelPair::new("x", "2")]);
        assert_eq!(metrics[1].gauge, Some(proto::Gauge { value: Some(2.0) }));
    }

    #[test]
    fn test_family_framing_writes_one_frame() {
        let mut sink = Vec::new();
        let mut emitter = RecordEmitter::new(&mut sink, Framing::Family, LabelBuffer::new());
        emitter
            .emit(&strings(&["x"]), &strings(&["1"]), RecordPayload::Counter(1.0))
            .unwrap();
        emitter
            .emit(&[], &[], RecordPayload::Counter(2.0))
            .unwrap();
        let header = FamilyHeader {
            name: "c",
            help: "a counter",
            metric_type: proto::MetricType::Counter,
        };
        emitter.finish(header).unwrap();

        let families = decode_families(sink.into()).unwrap();
        assert_eq!(families.len(), 1);
        let family = &families[0];
        assert_eq!(family.name.as_deref(), Some("c"));
        assert_eq!(family.help.as_deref(), Some("a counter"));
        assert_eq!(family.r#type(), proto::MetricType::Counter);
        assert_eq!(family.metric.len(), 2);
        assert!(family.metric[1].label.is_empty());
    }

    #[test]
    fn test_emit_leaves_buffer_at_mark() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let consts = [("env".to_string(), "prod".to_string())];
        for framing in [Framing::Family, Framing::Metric] {
            let mut sink = Vec::new();
            let mut emitter =
                RecordEmitter::new(&mut sink, framing, LabelBuffer::with_const_labels(&consts));
            for i in 0..3 {
                let value = i.to_string();
                emitter
                    .emit(&strings(&["a", "b"]), &strings(&["x", value.as_str()]), RecordPayload::Gauge(1.0))
                    .unwrap();
                assert_eq!(emitter.labels().len(), 1);
            }
        }

        let mut closed = Closed;
        let mut emitter =
            RecordEmitter::new(&mut closed, Framing::Metric, LabelBuffer::with_const_labels(&consts));
        assert!(emitter
            .emit(&strings(&["a"]), &strings(&["x"]), RecordPayload::Counter(1.0))
            .is_err());
        assert_eq!(emitter.labels().len(), 1);
        assert_eq!(emitter.records(), 0);
    }

    #[test]
    fn test_family_without_records_writes_nothing() {
        let mut sink = Vec::new();
        let emitter = RecordEmitter::new(&mut sink, Framing::Family, LabelBuffer::new());
        let header = FamilyHeader {
            name: "c",
            help: "",
            metric_type: proto::MetricType::Counter,
        };
        emitter.finish(header).unwrap();
        assert!(sink.is_empty());
    }
}
