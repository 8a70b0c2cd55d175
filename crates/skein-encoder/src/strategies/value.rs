//! Inline value composition: primitives, enums, nullables, key/value
//! pairs and plain structs. Values carry no identity and no type id.

use skein_sink::PrimitiveSink;
use skein_types::{PrimitiveKind, TypeHandle, TypeKind, Value};

use crate::compiler::PlanCompiler;
use crate::error::{EncodeError, EncodeResult};
use crate::plan::{slot_writer, SlotWriter};
use crate::strategies::fields::FieldLayout;

/// Writer for an inline value of type `ty`.
pub(crate) fn compile(compiler: &mut PlanCompiler<'_>, ty: TypeHandle) -> EncodeResult<SlotWriter> {
    compiler.enter_value(ty)?;
    let writer = compile_inner(compiler, ty);
    compiler.leave_value();
    writer
}

fn compile_inner(compiler: &mut PlanCompiler<'_>, ty: TypeHandle) -> EncodeResult<SlotWriter> {
    let def = compiler.universe().get(ty)?;
    let name = def.name().to_string();
    let writer: SlotWriter = match def.kind() {
        TypeKind::Primitive(kind) => {
            let kind = *kind;
            slot_writer(move |enc, v| write_primitive(enc.sink(), kind, v))
        }
        TypeKind::Enum { underlying } => {
            let underlying = *underlying;
            slot_writer(move |enc, v| match v {
                Value::Enum(raw) => write_enum(enc.sink(), &name, underlying, *raw),
                other => Err(mismatch(&name, other)),
            })
        }
        TypeKind::Nullable(inner) => {
            let inner = compile(compiler, *inner)?;
            slot_writer(move |enc, v| match v {
                Value::Nullable(None) | Value::Null => Ok(enc.sink().write_bool(false)?),
                Value::Nullable(Some(present)) => {
                    enc.sink().write_bool(true)?;
                    inner(enc, present)
                }
                other => Err(mismatch(&name, other)),
            })
        }
        TypeKind::KeyValuePair { key, value } => {
            let (key, value) = (*key, *value);
            let key = compiler.slot_writer(key)?;
            let value = compiler.slot_writer(value)?;
            slot_writer(move |enc, v| match v {
                Value::Pair(k, v) => {
                    key(enc, k)?;
                    value(enc, v)
                }
                other => Err(mismatch(&name, other)),
            })
        }
        TypeKind::Struct { fields } => {
            let layout = FieldLayout::compile(compiler, ty, fields)?;
            slot_writer(move |enc, v| match v {
                Value::Struct(s) => layout.write(enc, &s.fields),
                other => Err(mismatch(&name, other)),
            })
        }
        other => {
            return Err(EncodeError::Unclassifiable {
                ty: name,
                reason: format!("{} is not a value shape", other.tag()),
            })
        }
    };
    Ok(writer)
}

fn mismatch(expected: &str, found: &Value) -> EncodeError {
    EncodeError::ValueMismatch {
        expected: expected.to_string(),
        found: found.kind_name(),
    }
}

fn write_enum(sink: &mut dyn PrimitiveSink, name: &str, underlying: PrimitiveKind, raw: i64) -> EncodeResult<()> {
    let out_of_range = || EncodeError::ValueMismatch {
        expected: name.to_string(),
        found: "out-of-range enum",
    };
    match underlying {
        PrimitiveKind::I8 => sink.write_i8(i8::try_from(raw).map_err(|_| out_of_range())?)?,
        PrimitiveKind::U8 => sink.write_u8(u8::try_from(raw).map_err(|_| out_of_range())?)?,
        PrimitiveKind::I16 => sink.write_i16(i16::try_from(raw).map_err(|_| out_of_range())?)?,
        PrimitiveKind::U16 => sink.write_u16(u16::try_from(raw).map_err(|_| out_of_range())?)?,
        PrimitiveKind::I32 => sink.write_i32(i32::try_from(raw).map_err(|_| out_of_range())?)?,
        PrimitiveKind::U32 => sink.write_u32(u32::try_from(raw).map_err(|_| out_of_range())?)?,
        PrimitiveKind::I64 => sink.write_i64(raw)?,
        PrimitiveKind::U64 => sink.write_u64(u64::try_from(raw).map_err(|_| out_of_range())?)?,
        other => {
            return Err(EncodeError::Unclassifiable {
                ty: name.to_string(),
                reason: format!("enum backed by non-integer {}", other.name()),
            })
        }
    }
    Ok(())
}

/// Direct sink write of a primitive. The value must be exactly the
/// primitive's variant.
pub(crate) fn write_primitive(sink: &mut dyn PrimitiveSink, kind: PrimitiveKind, v: &Value) -> EncodeResult<()> {
    match (kind, v) {
        (PrimitiveKind::Bool, Value::Bool(x)) => sink.write_bool(*x)?,
        (PrimitiveKind::I8, Value::I8(x)) => sink.write_i8(*x)?,
        (PrimitiveKind::U8, Value::U8(x)) => sink.write_u8(*x)?,
        (PrimitiveKind::I16, Value::I16(x)) => sink.write_i16(*x)?,
        (PrimitiveKind::U16, Value::U16(x)) => sink.write_u16(*x)?,
        (PrimitiveKind::I32, Value::I32(x)) => sink.write_i32(*x)?,
        (PrimitiveKind::U32, Value::U32(x)) => sink.write_u32(*x)?,
        (PrimitiveKind::I64, Value::I64(x)) => sink.write_i64(*x)?,
        (PrimitiveKind::U64, Value::U64(x)) => sink.write_u64(*x)?,
        (PrimitiveKind::F32, Value::F32(x)) => sink.write_f32(*x)?,
        (PrimitiveKind::F64, Value::F64(x)) => sink.write_f64(*x)?,
        (PrimitiveKind::Char, Value::Char(x)) => sink.write_char(*x)?,
        (PrimitiveKind::Guid, Value::Guid(x)) => sink.write_guid(*x)?,
        (PrimitiveKind::Timestamp, Value::Timestamp(x)) => sink.write_timestamp(*x)?,
        (PrimitiveKind::Duration, Value::Duration(x)) => sink.write_duration(*x)?,
        (kind, other) => {
            return Err(EncodeError::ValueMismatch {
                expected: kind.name().to_string(),
                found: other.kind_name(),
            })
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_sink::{RecordingSink, Written};

    #[test]
    fn primitive_exact_variant() {
        let mut sink = RecordingSink::new();
        write_primitive(&mut sink, PrimitiveKind::U16, &Value::U16(9)).unwrap();
        write_primitive(&mut sink, PrimitiveKind::Char, &Value::Char('z')).unwrap();
        assert_eq!(sink.log(), &[Written::U16(9), Written::Char('z')]);
    }

    #[test]
    fn primitive_mismatch_is_an_error() {
        let mut sink = RecordingSink::new();
        let err = write_primitive(&mut sink, PrimitiveKind::I32, &Value::I64(1)).unwrap_err();
        assert!(matches!(err, EncodeError::ValueMismatch { found: "i64", .. }));
        assert!(sink.log().is_empty());
    }

    #[test]
    fn identity_and_time_values() {
        let id = uuid::Uuid::from_u128(0x1234);
        let at = chrono::DateTime::from_timestamp(1_700_000_000, 5).unwrap();
        let took = chrono::TimeDelta::milliseconds(1500);
        let mut sink = RecordingSink::new();
        write_primitive(&mut sink, PrimitiveKind::Guid, &Value::Guid(id)).unwrap();
        write_primitive(&mut sink, PrimitiveKind::Timestamp, &Value::Timestamp(at)).unwrap();
        write_primitive(&mut sink, PrimitiveKind::Duration, &Value::Duration(took)).unwrap();
        assert_eq!(
            sink.log(),
            &[Written::Guid(id), Written::Timestamp(at), Written::Duration(took)]
        );
    }

    #[test]
    fn enum_narrows_to_underlying() {
        let mut sink = RecordingSink::new();
        write_enum(&mut sink, "Color", PrimitiveKind::U8, 3).unwrap();
        assert_eq!(sink.log(), &[Written::U8(3)]);
        let err = write_enum(&mut sink, "Color", PrimitiveKind::U8, 300).unwrap_err();
        assert!(matches!(err, EncodeError::ValueMismatch { found: "out-of-range enum", .. }));
    }
}
