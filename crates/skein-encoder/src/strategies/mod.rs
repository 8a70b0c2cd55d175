//! Per-shape encoding strategies. Each `compile` function runs once per
//! type (or formal slot type) and returns a closure that runs once per
//! instance.

pub(crate) mod array;
pub(crate) mod collection;
pub(crate) mod fields;
pub(crate) mod reference;
pub(crate) mod value;

use skein_sink::{PrimitiveSink, SinkError};
use skein_types::Body;

use crate::error::{EncodeError, EncodeResult};

/// Count or length prefix.
pub(crate) fn write_len(sink: &mut dyn PrimitiveSink, what: &'static str, len: usize) -> EncodeResult<()> {
    let len = i32::try_from(len).map_err(|_| SinkError::LengthOverflow { what, len })?;
    sink.write_i32(len)?;
    Ok(())
}

pub(crate) fn body_tag(body: &Body) -> &'static str {
    match body {
        Body::Str(_) => "string",
        Body::Fields(_) => "fields",
        Body::Array { .. } => "array",
        Body::Items(_) => "items",
        Body::Entries(_) => "entries",
        Body::Boxed(_) => "boxed",
        Body::Custom(_) => "custom",
        Body::Empty => "empty",
    }
}

pub(crate) fn body_mismatch(ty: &str, expected: &str, found: &Body) -> EncodeError {
    EncodeError::ShapeMismatch {
        ty: ty.to_string(),
        reason: format!("expected a {expected} body, found {}", body_tag(found)),
    }
}
