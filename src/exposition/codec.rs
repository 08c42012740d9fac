//! Reading side of a length-delimited protobuf stream

use std::marker::PhantomData;

use bytes::{Buf, Bytes};
use prost::{DecodeError, Message};

use super::proto::{Metric, MetricFamily};

/// Iterates varint-length-prefixed messages out of a buffer
///
/// Stops after the first decode error.
pub struct DelimitedReader<M> {
    buf: Bytes,
    failed: bool,
    _message: PhantomData<M>,
}

impl<M: Message + Default> DelimitedReader<M> {
    pub fn new(buf: Bytes) -> Self {
        DelimitedReader {
            buf,
            failed: false,
            _message: PhantomData,
        }
    }
}

impl<M: Message + Default> Iterator for DelimitedReader<M> {
    type Item = Result<M, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.buf.has_remaining() {
            return None;
        }
        let item = M::decode_length_delimited(&mut self.buf);
        self.failed = item.is_err();
        Some(item)
    }
}

/// Decode a whole `Family`-framed stream
pub fn decode_families(buf: Bytes) -> Result<Vec<MetricFamily>, DecodeError> {
    DelimitedReader::<MetricFamily>::new(buf).collect()
}

/// Decode a whole `Metric`-framed stream
pub fn decode_metrics(buf: Bytes) -> Result<Vec<Metric>, DecodeError> {
    DelimitedReader::<Metric>::new(buf).collect()
}
