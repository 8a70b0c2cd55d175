//! Reference composition: `[typeId] [identityId] [inline body]`, or the
//! null sentinel.

use skein_types::{ObjRef, TypeHandle, Value};

use crate::classifier::{can_be_created_with_data_only, is_sealed};
use crate::compiler::PlanCompiler;
use crate::encoder::GraphEncoder;
use crate::error::{EncodeError, EncodeResult};
use crate::plan::{slot_writer, SlotWriter};

/// Id written for a null reference.
pub const NULL_REFERENCE: i32 = -1;

/// What is known at compile time about the target's transience.
///
/// A transient formal type never reaches this module: its slot writer is
/// a no-op, so a sealed formal type here is always known to be safe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transience {
    /// Sealed: the runtime type is the formal type, which is not transient.
    KnownSafe,
    /// Open formal type: ask about the runtime type.
    CheckRuntime,
}

/// How the runtime type id is obtained.
#[derive(Clone, Copy, Debug)]
enum TypeIdSource {
    Static { id: i32, ty: TypeHandle },
    Dynamic,
}

/// Writer for a reference slot declared as the non-transient `formal`.
pub(crate) fn compile(compiler: &mut PlanCompiler<'_>, formal: TypeHandle) -> EncodeResult<SlotWriter> {
    let universe = compiler.universe();
    let sealed = is_sealed(universe, formal);
    let source = if sealed {
        TypeIdSource::Static {
            id: compiler.catalog_index(formal)?,
            ty: formal,
        }
    } else {
        TypeIdSource::Dynamic
    };
    let transience = if sealed {
        Transience::KnownSafe
    } else {
        Transience::CheckRuntime
    };
    // A sealed formal type fixes the runtime type, so its inlining
    // eligibility is known now.
    let open = formal == TypeHandle::OBJECT;
    let static_inline = open || (sealed && can_be_created_with_data_only(universe, formal));
    let formal_name = compiler.name(formal);

    Ok(slot_writer(move |enc, v| {
        let obj = match v {
            Value::Null => {
                enc.sink().write_i32(NULL_REFERENCE)?;
                return Ok(());
            }
            Value::Ref(obj) => obj,
            other => {
                return Err(EncodeError::ValueMismatch {
                    expected: formal_name.clone(),
                    found: other.kind_name(),
                })
            }
        };
        write_reference(enc, obj, source, transience, static_inline, &formal_name)
    }))
}

fn write_reference(
    enc: &mut GraphEncoder<'_>,
    obj: &ObjRef,
    source: TypeIdSource,
    transience: Transience,
    static_inline: bool,
    formal_name: &str,
) -> EncodeResult<()> {
    match source {
        TypeIdSource::Static { id, ty } => {
            if obj.ty() != ty {
                return Err(EncodeError::ValueMismatch {
                    expected: formal_name.to_string(),
                    found: "instance of another type",
                });
            }
            enc.sink().write_i32(id)?;
        }
        TypeIdSource::Dynamic => {
            let id = enc.type_id_of(obj.ty())?;
            enc.sink().write_i32(id)?;
        }
    }

    if transience == Transience::CheckRuntime && enc.is_transient(obj.ty()) {
        return Ok(());
    }

    let may_inline = static_inline || enc.is_data_only(obj.ty());
    enc.write_identity(obj, may_inline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TypeClassifier;
    use crate::compiler::CompilerState;
    use skein_catalog::{InMemoryTypeCatalog, TypeCatalog};
    use skein_sink::{RecordingSink, Written};
    use skein_types::TypeUniverse;

    #[test]
    fn sealed_formal_catalogs_type_at_compile_time() {
        let mut universe = TypeUniverse::new();
        let leaf = universe.declare_class("Leaf").unwrap();
        universe.mark_sealed(leaf).unwrap();

        let mut catalog = InMemoryTypeCatalog::new();
        let mut classifier = TypeClassifier::new();
        let mut state = CompilerState::default();
        let writer = {
            let mut compiler = PlanCompiler::new(&universe, &mut catalog, &mut classifier, &mut state);
            compile(&mut compiler, leaf).unwrap()
        };
        assert_eq!(catalog.lookup(leaf), Some(0));
        assert_eq!(classifier.memoized(), 0);

        // Static type id, then the identity id. A class is not data-only,
        // so its body is left for the drain.
        let mut sink = RecordingSink::new();
        let mut enc = GraphEncoder::new(&universe, &mut sink).unwrap();
        let target = ObjRef::with_fields(leaf, vec![]);
        writer(&mut enc, &Value::Ref(target)).unwrap();
        assert!(!enc.is_written(0));
        drop(enc);
        assert_eq!(sink.log(), &[Written::I32(0), Written::I32(0)]);
    }
}
