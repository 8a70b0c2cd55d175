//! Collections (`count` then elements) and dictionaries (`count` then
//! flattened key/value pairs).

use skein_types::{Body, ObjRef, TypeHandle, TypeKind, Value};

use crate::compiler::PlanCompiler;
use crate::error::EncodeResult;
use crate::plan::{plan_body, PlanFn};
use crate::strategies::{body_mismatch, write_len};

/// A transient element type still counts every item but writes nothing
/// for any of them.
pub(crate) fn compile_collection(
    compiler: &mut PlanCompiler<'_>,
    ty: TypeHandle,
    element: TypeHandle,
) -> EncodeResult<Box<PlanFn>> {
    let element = compiler.slot_writer(element)?;
    let name = compiler.name(ty);
    Ok(plan_body(move |enc, obj| {
        let body = obj.body();
        let Body::Items(items) = &*body else {
            return Err(body_mismatch(&name, "items", &body));
        };
        write_len(enc.sink(), "collection count", items.len())?;
        for item in items {
            element(enc, item)?;
        }
        Ok(())
    }))
}

/// Keys and values are both written against `object`. Value-typed
/// entries are boxed first, so each one becomes its own object.
pub(crate) fn compile_dictionary(
    compiler: &mut PlanCompiler<'_>,
    ty: TypeHandle,
    key: TypeHandle,
    value: TypeHandle,
) -> EncodeResult<Box<PlanFn>> {
    let object = compiler.slot_writer(TypeHandle::OBJECT)?;
    let key_boxing = Boxing::for_declared(compiler, key);
    let value_boxing = Boxing::for_declared(compiler, value);
    let name = compiler.name(ty);
    Ok(plan_body(move |enc, obj| {
        let body = obj.body();
        let Body::Entries(entries) = &*body else {
            return Err(body_mismatch(&name, "entries", &body));
        };
        write_len(enc.sink(), "dictionary count", entries.len())?;
        for (k, v) in entries {
            object(enc, &key_boxing.apply(k))?;
            object(enc, &value_boxing.apply(v))?;
        }
        Ok(())
    }))
}

/// How a declared dictionary type turns an entry into an `object` slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Boxing {
    /// Reference type: the slot value is used as is.
    Pass,
    /// Value type: wrap in a fresh object of that type.
    Box(TypeHandle),
    /// Nullable value type: absent becomes null, present is boxed as
    /// the underlying type.
    Nullable(TypeHandle),
}

impl Boxing {
    fn for_declared(compiler: &PlanCompiler<'_>, declared: TypeHandle) -> Self {
        match compiler.universe().get(declared).map(|def| def.kind()) {
            Ok(TypeKind::Nullable(inner)) => Boxing::Nullable(*inner),
            Ok(kind) if kind.is_value() => Boxing::Box(declared),
            _ => Boxing::Pass,
        }
    }

    fn apply(self, v: &Value) -> Value {
        match (self, v) {
            (Boxing::Pass, v) => v.clone(),
            (Boxing::Box(ty), v) => Value::Ref(ObjRef::boxed(ty, v.clone())),
            (Boxing::Nullable(_), Value::Null | Value::Nullable(None)) => Value::Null,
            (Boxing::Nullable(ty), Value::Nullable(Some(inner))) => {
                Value::Ref(ObjRef::boxed(ty, (**inner).clone()))
            }
            (Boxing::Nullable(ty), v) => Value::Ref(ObjRef::boxed(ty, v.clone())),
        }
    }
}
