//! Primitive byte sink for the skein object-graph serializer.
//!
//! The sink is the only I/O boundary of the encoder. Everything the core
//! writes goes through the typed operations of [`PrimitiveSink`].
//!
//! # Implementations
//!
//! - [`PrimitiveWriter`] -- buffered writer over any [`std::io::Write`],
//!   with fixed-width or LEB128 integer encoding
//! - [`RecordingSink`] -- in-memory writer that also keeps a log of every
//!   typed write, for asserting record layouts in tests

pub mod error;
pub mod recording;
pub mod sink;
pub mod writer;

pub use error::{SinkError, SinkResult};
pub use recording::{RecordingSink, Written};
pub use sink::PrimitiveSink;
pub use writer::{IntEncoding, PrimitiveWriter, DEFAULT_BUFFER_CAPACITY};
