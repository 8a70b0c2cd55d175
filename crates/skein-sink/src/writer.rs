use std::io::{BufWriter, Write};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use crate::error::{SinkError, SinkResult};
use crate::sink::PrimitiveSink;

/// Default capacity of the internal write buffer (64 KiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// How multi-byte integers are laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntEncoding {
    /// Little-endian, natural width.
    #[default]
    Fixed,
    /// LEB128; signed values are zigzag-mapped first.
    Varint,
}

/// Buffered primitive writer over any byte stream.
///
/// Single-byte values (`bool`, `u8`, `i8`) are always written raw. Floats
/// are always written as their little-endian IEEE bits, whatever the
/// [`IntEncoding`].
pub struct PrimitiveWriter<W: Write> {
    inner: BufWriter<W>,
    encoding: IntEncoding,
    position: u64,
}

impl<W: Write> PrimitiveWriter<W> {
    /// Create a fixed-width writer with the default buffer capacity.
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, IntEncoding::Fixed, DEFAULT_BUFFER_CAPACITY)
    }

    /// Writer with an explicit integer layout and buffer size. A zero
    /// capacity is raised to one.
    pub fn with_options(inner: W, encoding: IntEncoding, buffer_capacity: usize) -> Self {
        Self {
            inner: BufWriter::with_capacity(buffer_capacity.max(1), inner),
            encoding,
            position: 0,
        }
    }

    /// Integer layout in use.
    pub fn encoding(&self) -> IntEncoding {
        self.encoding
    }

    /// Flush buffered bytes to the underlying stream.
    pub fn flush(&mut self) -> SinkResult<()> {
        self.inner.flush()?;
        trace!(position = self.position, "flushed primitive writer");
        Ok(())
    }

    /// Flush and return the underlying stream.
    pub fn into_inner(self) -> SinkResult<W> {
        trace!(position = self.position, "closing primitive writer");
        self.inner
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }

    fn raw(&mut self, bytes: &[u8]) -> SinkResult<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    fn varint(&mut self, value: u64) -> SinkResult<()> {
        let mut buf = [0u8; 10];
        let n = encode_varint(&mut buf, value);
        self.raw(&buf[..n])
    }

    fn length_prefix(&mut self, what: &'static str, len: usize) -> SinkResult<()> {
        let len = i32::try_from(len).map_err(|_| SinkError::LengthOverflow { what, len })?;
        self.write_i32(len)
    }
}

impl<W: Write> PrimitiveSink for PrimitiveWriter<W> {
    fn write_bool(&mut self, value: bool) -> SinkResult<()> {
        self.raw(&[value as u8])
    }

    fn write_u8(&mut self, value: u8) -> SinkResult<()> {
        self.raw(&[value])
    }

    fn write_i8(&mut self, value: i8) -> SinkResult<()> {
        self.raw(&value.to_le_bytes())
    }

    fn write_i16(&mut self, value: i16) -> SinkResult<()> {
        match self.encoding {
            IntEncoding::Fixed => self.raw(&value.to_le_bytes()),
            IntEncoding::Varint => self.varint(zigzag(value as i64)),
        }
    }

    fn write_u16(&mut self, value: u16) -> SinkResult<()> {
        match self.encoding {
            IntEncoding::Fixed => self.raw(&value.to_le_bytes()),
            IntEncoding::Varint => self.varint(value as u64),
        }
    }

    fn write_i32(&mut self, value: i32) -> SinkResult<()> {
        match self.encoding {
            IntEncoding::Fixed => self.raw(&value.to_le_bytes()),
            IntEncoding::Varint => self.varint(zigzag(value as i64)),
        }
    }

    fn write_u32(&mut self, value: u32) -> SinkResult<()> {
        match self.encoding {
            IntEncoding::Fixed => self.raw(&value.to_le_bytes()),
            IntEncoding::Varint => self.varint(value as u64),
        }
    }

    fn write_i64(&mut self, value: i64) -> SinkResult<()> {
        match self.encoding {
            IntEncoding::Fixed => self.raw(&value.to_le_bytes()),
            IntEncoding::Varint => self.varint(zigzag(value)),
        }
    }

    fn write_u64(&mut self, value: u64) -> SinkResult<()> {
        match self.encoding {
            IntEncoding::Fixed => self.raw(&value.to_le_bytes()),
            IntEncoding::Varint => self.varint(value),
        }
    }

    fn write_f32(&mut self, value: f32) -> SinkResult<()> {
        self.raw(&value.to_bits().to_le_bytes())
    }

    fn write_f64(&mut self, value: f64) -> SinkResult<()> {
        self.raw(&value.to_bits().to_le_bytes())
    }

    fn write_char(&mut self, value: char) -> SinkResult<()> {
        self.write_u32(value as u32)
    }

    fn write_str(&mut self, value: &str) -> SinkResult<()> {
        self.length_prefix("string", value.len())?;
        self.raw(value.as_bytes())
    }

    fn write_bytes(&mut self, value: &[u8]) -> SinkResult<()> {
        self.length_prefix("byte array", value.len())?;
        self.raw(value)
    }

    fn write_guid(&mut self, value: Uuid) -> SinkResult<()> {
        self.raw(value.as_bytes())
    }

    fn write_timestamp(&mut self, value: DateTime<Utc>) -> SinkResult<()> {
        self.write_i64(value.timestamp())?;
        self.write_i32(value.timestamp_subsec_nanos() as i32)
    }

    fn write_duration(&mut self, value: TimeDelta) -> SinkResult<()> {
        self.write_i64(value.num_seconds())?;
        self.write_i32(value.subsec_nanos())
    }

    fn position(&self) -> u64 {
        self.position
    }
}

impl<W: Write> std::fmt::Debug for PrimitiveWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimitiveWriter")
            .field("encoding", &self.encoding)
            .field("position", &self.position)
            .finish()
    }
}

/// Map a signed value onto the unsigned range so small magnitudes stay short.
pub(crate) fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Encode a u64 as LEB128 into `buf`. Returns the number of bytes used.
pub(crate) fn encode_varint(buf: &mut [u8; 10], mut value: u64) -> usize {
    let mut i = 0;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf[i] = byte;
        i += 1;
        if value == 0 {
            return i;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed() -> PrimitiveWriter<Vec<u8>> {
        PrimitiveWriter::new(Vec::new())
    }

    fn varint() -> PrimitiveWriter<Vec<u8>> {
        PrimitiveWriter::with_options(Vec::new(), IntEncoding::Varint, 16)
    }

    #[test]
    fn fixed_i32_is_little_endian() {
        let mut w = fixed();
        w.write_i32(7).unwrap();
        w.write_i32(-1).unwrap();
        assert_eq!(w.position(), 8);
        assert_eq!(w.into_inner().unwrap(), vec![7, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn bool_is_one_byte() {
        let mut w = fixed();
        w.write_bool(true).unwrap();
        w.write_bool(false).unwrap();
        assert_eq!(w.into_inner().unwrap(), vec![1, 0]);
    }

    #[test]
    fn string_is_length_prefixed() {
        let mut w = fixed();
        w.write_str("A").unwrap();
        assert_eq!(w.position(), 5);
        assert_eq!(w.into_inner().unwrap(), vec![1, 0, 0, 0, b'A']);
    }

    #[test]
    fn varint_small_values_are_one_byte() {
        let mut w = varint();
        w.write_i32(-1).unwrap();
        w.write_u64(42).unwrap();
        assert_eq!(w.position(), 2);
        // zigzag(-1) == 1
        assert_eq!(w.into_inner().unwrap(), vec![1, 42]);
    }

    #[test]
    fn varint_large_value() {
        let mut w = varint();
        w.write_u64(1_000_000).unwrap();
        assert_eq!(w.into_inner().unwrap(), vec![0xC0, 0x84, 0x3D]);
    }

    #[test]
    fn varint_max_u64_is_ten_bytes() {
        let mut w = varint();
        w.write_u64(u64::MAX).unwrap();
        assert_eq!(w.position(), 10);
    }

    #[test]
    fn floats_ignore_int_encoding() {
        let mut w = varint();
        w.write_f64(1.5).unwrap();
        assert_eq!(w.position(), 8);
        assert_eq!(w.into_inner().unwrap(), 1.5f64.to_bits().to_le_bytes().to_vec());
    }

    #[test]
    fn guid_is_sixteen_raw_bytes() {
        let id = Uuid::from_bytes([9u8; 16]);
        let mut w = fixed();
        w.write_guid(id).unwrap();
        assert_eq!(w.into_inner().unwrap(), vec![9u8; 16]);
    }

    #[test]
    fn timestamp_is_seconds_and_nanos() {
        let ts = DateTime::from_timestamp(1_000, 500).unwrap();
        let mut w = fixed();
        w.write_timestamp(ts).unwrap();
        let bytes = w.into_inner().unwrap();
        assert_eq!(&bytes[..8], &1_000i64.to_le_bytes());
        assert_eq!(&bytes[8..], &500i32.to_le_bytes());
    }

    #[test]
    fn position_survives_small_buffer() {
        let mut w = PrimitiveWriter::with_options(Vec::new(), IntEncoding::Fixed, 2);
        for i in 0..100u32 {
            w.write_u32(i).unwrap();
        }
        assert_eq!(w.position(), 400);
        assert_eq!(w.into_inner().unwrap().len(), 400);
    }

    #[test]
    fn file_backed_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let file = std::fs::File::create(&path).unwrap();
        let mut w = PrimitiveWriter::new(file);
        w.write_str("persisted").unwrap();
        w.flush().unwrap();
        drop(w);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 4 + "persisted".len());
    }

    proptest! {
        #[test]
        fn zigzag_keeps_small_magnitudes_small(v in -63i64..=63) {
            prop_assert!(zigzag(v) < 128);
        }

        #[test]
        fn varint_length_matches_position(v in any::<u64>()) {
            let mut w = varint();
            w.write_u64(v).unwrap();
            let pos = w.position();
            prop_assert_eq!(w.into_inner().unwrap().len() as u64, pos);
        }
    }
}
