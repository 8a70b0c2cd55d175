//! High-level API for the skein object-graph serializer.
//!
//! [`Skein`] bundles a type universe with session settings and turns a
//! root object into bytes in one call. Lower-level control (custom sinks,
//! several roots per stream, callbacks) goes through
//! [`Skein::session`], which returns a [`GraphEncoder`].

pub mod blob;
pub mod config;
pub mod error;
pub mod skein;

pub use blob::BincodeBlob;
pub use config::{load_config, save_config};
pub use error::{SdkError, SdkResult};
pub use skein::Skein;

// Re-export key types
pub use skein_encoder::{EncodeError, EncoderConfig, GraphEncoder, SessionCallbacks, NULL_REFERENCE};
pub use skein_sink::{IntEncoding, PrimitiveSink, PrimitiveWriter, RecordingSink};
pub use skein_types::{
    Body, FieldDef, HookKind, HookMember, ObjRef, PrimitiveKind, SelfDescribing, StructValue,
    TypeHandle, TypeUniverse, Value,
};
