use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::error::SinkResult;

/// Typed primitive output.
///
/// Every operation appends to the underlying stream; there is no seeking
/// back. [`position`](PrimitiveSink::position) reports the number of bytes
/// produced so far, which is what length-suffixed records are measured
/// against.
pub trait PrimitiveSink {
    fn write_bool(&mut self, value: bool) -> SinkResult<()>;
    fn write_u8(&mut self, value: u8) -> SinkResult<()>;
    fn write_i8(&mut self, value: i8) -> SinkResult<()>;
    fn write_i16(&mut self, value: i16) -> SinkResult<()>;
    fn write_u16(&mut self, value: u16) -> SinkResult<()>;
    fn write_i32(&mut self, value: i32) -> SinkResult<()>;
    fn write_u32(&mut self, value: u32) -> SinkResult<()>;
    fn write_i64(&mut self, value: i64) -> SinkResult<()>;
    fn write_u64(&mut self, value: u64) -> SinkResult<()>;
    fn write_f32(&mut self, value: f32) -> SinkResult<()>;
    fn write_f64(&mut self, value: f64) -> SinkResult<()>;
    fn write_char(&mut self, value: char) -> SinkResult<()>;

    /// Length-prefixed UTF-8 string.
    fn write_str(&mut self, value: &str) -> SinkResult<()>;

    /// Length-prefixed raw bytes.
    fn write_bytes(&mut self, value: &[u8]) -> SinkResult<()>;

    fn write_guid(&mut self, value: Uuid) -> SinkResult<()>;
    fn write_timestamp(&mut self, value: DateTime<Utc>) -> SinkResult<()>;
    fn write_duration(&mut self, value: TimeDelta) -> SinkResult<()>;

    /// Number of bytes written so far.
    fn position(&self) -> u64;
}

impl<S: PrimitiveSink + ?Sized> PrimitiveSink for &mut S {
    fn write_bool(&mut self, value: bool) -> SinkResult<()> {
        (**self).write_bool(value)
    }
    fn write_u8(&mut self, value: u8) -> SinkResult<()> {
        (**self).write_u8(value)
    }
    fn write_i8(&mut self, value: i8) -> SinkResult<()> {
        (**self).write_i8(value)
    }
    fn write_i16(&mut self, value: i16) -> SinkResult<()> {
        (**self).write_i16(value)
    }
    fn write_u16(&mut self, value: u16) -> SinkResult<()> {
        (**self).write_u16(value)
    }
    fn write_i32(&mut self, value: i32) -> SinkResult<()> {
        (**self).write_i32(value)
    }
    fn write_u32(&mut self, value: u32) -> SinkResult<()> {
        (**self).write_u32(value)
    }
    fn write_i64(&mut self, value: i64) -> SinkResult<()> {
        (**self).write_i64(value)
    }
    fn write_u64(&mut self, value: u64) -> SinkResult<()> {
        (**self).write_u64(value)
    }
    fn write_f32(&mut self, value: f32) -> SinkResult<()> {
        (**self).write_f32(value)
    }
    fn write_f64(&mut self, value: f64) -> SinkResult<()> {
        (**self).write_f64(value)
    }
    fn write_char(&mut self, value: char) -> SinkResult<()> {
        (**self).write_char(value)
    }
    fn write_str(&mut self, value: &str) -> SinkResult<()> {
        (**self).write_str(value)
    }
    fn write_bytes(&mut self, value: &[u8]) -> SinkResult<()> {
        (**self).write_bytes(value)
    }
    fn write_guid(&mut self, value: Uuid) -> SinkResult<()> {
        (**self).write_guid(value)
    }
    fn write_timestamp(&mut self, value: DateTime<Utc>) -> SinkResult<()> {
        (**self).write_timestamp(value)
    }
    fn write_duration(&mut self, value: TimeDelta) -> SinkResult<()> {
        (**self).write_duration(value)
    }
    fn position(&self) -> u64 {
        (**self).position()
    }
}
