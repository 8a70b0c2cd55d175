use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::error::SinkResult;
use crate::sink::PrimitiveSink;
use crate::writer::PrimitiveWriter;

/// One typed write observed by a [`RecordingSink`].
#[derive(Clone, Debug, PartialEq)]
pub enum Written {
    Bool(bool),
    U8(u8),
    I8(i8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
    Guid(Uuid),
    Timestamp(DateTime<Utc>),
    Duration(TimeDelta),
}

/// In-memory sink that keeps both the fixed-width bytes and a log of
/// every typed write.
#[derive(Debug)]
pub struct RecordingSink {
    bytes: PrimitiveWriter<Vec<u8>>,
    log: Vec<Written>,
}

impl RecordingSink {
    /// Create a sink with an empty buffer and log.
    pub fn new() -> Self {
        Self {
            bytes: PrimitiveWriter::new(Vec::new()),
            log: Vec::new(),
        }
    }

    /// Typed writes in the order they happened.
    pub fn log(&self) -> &[Written] {
        &self.log
    }

    /// Drain the log, leaving the byte stream untouched.
    pub fn take_log(&mut self) -> Vec<Written> {
        std::mem::take(&mut self.log)
    }

    /// The fixed-width encoding of everything written so far.
    pub fn into_bytes(self) -> SinkResult<Vec<u8>> {
        self.bytes.into_inner()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! record {
    ($name:ident, $ty:ty, $variant:ident) => {
        fn $name(&mut self, value: $ty) -> SinkResult<()> {
            self.bytes.$name(value)?;
            self.log.push(Written::$variant(value));
            Ok(())
        }
    };
}

impl PrimitiveSink for RecordingSink {
    record!(write_bool, bool, Bool);
    record!(write_u8, u8, U8);
    record!(write_i8, i8, I8);
    record!(write_i16, i16, I16);
    record!(write_u16, u16, U16);
    record!(write_i32, i32, I32);
    record!(write_u32, u32, U32);
    record!(write_i64, i64, I64);
    record!(write_u64, u64, U64);
    record!(write_f32, f32, F32);
    record!(write_f64, f64, F64);
    record!(write_char, char, Char);
    record!(write_guid, Uuid, Guid);
    record!(write_timestamp, DateTime<Utc>, Timestamp);
    record!(write_duration, TimeDelta, Duration);

    fn write_str(&mut self, value: &str) -> SinkResult<()> {
        self.bytes.write_str(value)?;
        self.log.push(Written::Str(value.to_owned()));
        Ok(())
    }

    fn write_bytes(&mut self, value: &[u8]) -> SinkResult<()> {
        self.bytes.write_bytes(value)?;
        self.log.push(Written::Bytes(value.to_vec()));
        Ok(())
    }

    fn position(&self) -> u64 {
        self.bytes.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut sink = RecordingSink::new();
        sink.write_i32(2).unwrap();
        sink.write_str("x").unwrap();
        sink.write_bool(true).unwrap();
        assert_eq!(
            sink.log(),
            &[Written::I32(2), Written::Str("x".into()), Written::Bool(true)]
        );
    }

    #[test]
    fn position_tracks_fixed_width_bytes() {
        let mut sink = RecordingSink::new();
        sink.write_i64(1).unwrap();
        sink.write_u8(1).unwrap();
        assert_eq!(sink.position(), 9);
        assert_eq!(sink.into_bytes().unwrap().len(), 9);
    }

    #[test]
    fn take_log_keeps_bytes() {
        let mut sink = RecordingSink::new();
        sink.write_i32(5).unwrap();
        assert_eq!(sink.take_log(), vec![Written::I32(5)]);
        assert!(sink.log().is_empty());
        assert_eq!(sink.position(), 4);
    }

    #[test]
    fn works_through_mut_reference() {
        fn emit(mut sink: impl PrimitiveSink) {
            sink.write_u16(3).unwrap();
        }
        let mut sink = RecordingSink::new();
        emit(&mut sink);
        assert_eq!(sink.log(), &[Written::U16(3)]);
    }
}
