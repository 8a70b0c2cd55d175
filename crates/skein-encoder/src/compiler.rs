//! Per-type plan compilation.
//!
//! For a runtime type the first matching rule decides the plan body:
//!
//! 1. string -- direct string write
//! 2. self-describing -- the type's own save routine, then its byte length
//! 3. value type (only reachable boxed) -- inline value write
//! 4. array
//! 5. collection or dictionary
//! 6. anything else with fields -- field-by-field, sorted by name
//!
//! Slot writers (how a field or element of a given *formal* type is
//! written) are cached per formal type for the whole session.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use skein_catalog::TypeCatalog;
use skein_types::{Body, HookKind, HookMember, TypeHandle, TypeKind, TypeUniverse};

use crate::classifier::{SerializationType, TypeClassifier};
use crate::error::{EncodeError, EncodeResult};
use crate::plan::{self, plan_body, PlanFn, PlanShape, SlotWriter, WritePlan};
use crate::strategies::{self, array, collection, fields::FieldLayout, reference, value};

/// Compilation state that outlives a single regeneration pass.
#[derive(Default)]
pub(crate) struct CompilerState {
    slot_writers: HashMap<TypeHandle, SlotWriter>,
    array_plans: u64,
    /// Value types whose writer is being built, to reject types that
    /// contain themselves by value.
    value_stack: Vec<TypeHandle>,
}

impl CompilerState {
    pub(crate) fn cached_writers(&self) -> usize {
        self.slot_writers.len()
    }
}

/// Borrowed view over everything plan compilation touches.
pub(crate) struct PlanCompiler<'c> {
    universe: &'c TypeUniverse,
    catalog: &'c mut dyn TypeCatalog,
    classifier: &'c mut TypeClassifier,
    state: &'c mut CompilerState,
}

impl<'c> PlanCompiler<'c> {
    pub(crate) fn new(
        universe: &'c TypeUniverse,
        catalog: &'c mut dyn TypeCatalog,
        classifier: &'c mut TypeClassifier,
        state: &'c mut CompilerState,
    ) -> Self {
        Self {
            universe,
            catalog,
            classifier,
            state,
        }
    }

    pub(crate) fn universe(&self) -> &'c TypeUniverse {
        self.universe
    }

    pub(crate) fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    pub(crate) fn catalog_index(&mut self, ty: TypeHandle) -> EncodeResult<i32> {
        Ok(self.catalog.index_of(ty)?)
    }

    pub(crate) fn is_transient(&mut self, ty: TypeHandle) -> bool {
        self.classifier.is_transient(self.universe, ty)
    }

    pub(crate) fn name(&self, ty: TypeHandle) -> String {
        self.universe.name(ty).to_string()
    }

    /// Unique label for an array plan within this session.
    pub(crate) fn next_array_label(&mut self) -> String {
        self.state.array_plans += 1;
        format!("write_array{}", self.state.array_plans)
    }

    /// Compile the plan for the type cataloged at `type_id`. Transient
    /// types get no plan.
    pub(crate) fn compile_slot(&mut self, type_id: i32) -> EncodeResult<Option<WritePlan>> {
        let ty = self.catalog.type_at(type_id).ok_or(EncodeError::MissingPlan(type_id))?;
        if self.is_transient(ty) {
            debug!(type_id, ty = self.universe.name(ty), "transient type, no plan");
            return Ok(None);
        }
        let pre_write = self.hooks(ty, HookKind::PreWrite)?;
        let post_write = self.hooks(ty, HookKind::PostWrite)?;
        let (shape, label, body) = self.compile_body(ty)?;
        debug!(type_id, ty = self.universe.name(ty), ?shape, %label, "compiled write plan");
        Ok(Some(WritePlan::new(type_id, ty, shape, label, pre_write, post_write, body)))
    }

    fn hooks(&self, ty: TypeHandle, kind: HookKind) -> EncodeResult<Vec<HookMember>> {
        let hooks = self.universe.hooks(ty, kind);
        if let Some(bad) = hooks.iter().find(|h| h.params > 1) {
            return Err(EncodeError::HookSignature {
                ty: self.name(ty),
                hook: bad.name.clone(),
                params: bad.params,
            });
        }
        Ok(hooks.to_vec())
    }

    fn compile_body(&mut self, ty: TypeHandle) -> EncodeResult<(PlanShape, String, Box<PlanFn>)> {
        let def = self.universe.get(ty)?;
        let name = def.name().to_string();
        let label = format!("write_{name}");

        if matches!(def.kind(), TypeKind::String) {
            let body = plan_body(move |enc, obj| match &*obj.body() {
                Body::Str(s) => Ok(enc.sink().write_str(s)?),
                other => Err(strategies::body_mismatch(&name, "string", other)),
            });
            return Ok((PlanShape::String, label, body));
        }

        if matches!(def.kind(), TypeKind::SelfDescribing) {
            let body = plan_body(move |enc, obj| {
                let start = enc.sink().position();
                match &*obj.body() {
                    Body::Custom(custom) => custom.save(enc.sink())?,
                    other => return Err(strategies::body_mismatch(&name, "custom", other)),
                }
                let consumed = enc.sink().position() - start;
                enc.sink().write_i64(consumed as i64)?;
                Ok(())
            });
            return Ok((PlanShape::SelfDescribing, label, body));
        }

        if def.is_value() {
            // A value type only gets a plan when it sits boxed in a
            // reference slot; it is written as its inline form.
            let inline = value::compile(self, ty)?;
            let body = plan_body(move |enc, obj| match &*obj.body() {
                Body::Boxed(v) => inline(enc, v),
                other => Err(strategies::body_mismatch(&name, "boxed", other)),
            });
            return Ok((PlanShape::BoxedValue, label, body));
        }

        match def.kind() {
            TypeKind::Array { element, rank } => {
                let (element, rank) = (*element, *rank);
                let label = self.next_array_label();
                let body = array::compile(self, ty, element, rank)?;
                Ok((PlanShape::Array { rank }, label, body))
            }
            TypeKind::Collection { element } => {
                let element = *element;
                let body = collection::compile_collection(self, ty, element)?;
                Ok((PlanShape::Collection, label, body))
            }
            TypeKind::Dictionary { key, value } => {
                let (key, value) = (*key, *value);
                let body = collection::compile_dictionary(self, ty, key, value)?;
                Ok((PlanShape::Dictionary, label, body))
            }
            TypeKind::Object | TypeKind::Class { .. } => {
                let fields = def.kind().fields().unwrap_or(&[]);
                let layout = FieldLayout::compile(self, ty, fields)?;
                let shape = PlanShape::Fields { count: layout.len() };
                let body = plan_body(move |enc, obj| match &*obj.body() {
                    Body::Fields(values) => layout.write(enc, values),
                    Body::Empty if layout.declared() == 0 => Ok(()),
                    other => Err(strategies::body_mismatch(&name, "fields", other)),
                });
                Ok((shape, label, body))
            }
            other => Err(EncodeError::Unclassifiable {
                ty: name,
                reason: format!("{} types have no serializable layout", other.tag()),
            }),
        }
    }

    /// Writer for a slot declared as `formal`.
    pub(crate) fn slot_writer(&mut self, formal: TypeHandle) -> EncodeResult<SlotWriter> {
        if let Some(writer) = self.state.slot_writers.get(&formal) {
            return Ok(Rc::clone(writer));
        }
        let writer: SlotWriter = match self.classifier.serialization_type(self.universe, formal) {
            SerializationType::Transient => plan::slot_writer(|_, _| Ok(())),
            SerializationType::Value => value::compile(self, formal)?,
            SerializationType::Reference => reference::compile(self, formal)?,
        };
        self.state.slot_writers.insert(formal, Rc::clone(&writer));
        Ok(writer)
    }

    pub(crate) fn enter_value(&mut self, ty: TypeHandle) -> EncodeResult<()> {
        if self.state.value_stack.contains(&ty) {
            return Err(EncodeError::Unclassifiable {
                ty: self.name(ty),
                reason: "value type contains itself by value".into(),
            });
        }
        self.state.value_stack.push(ty);
        Ok(())
    }

    pub(crate) fn leave_value(&mut self) {
        self.state.value_stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_catalog::InMemoryTypeCatalog;
    use skein_types::{FieldDef, PrimitiveKind};

    struct Fixture {
        universe: TypeUniverse,
        catalog: InMemoryTypeCatalog,
        classifier: TypeClassifier,
        state: CompilerState,
    }

    impl Fixture {
        fn new(universe: TypeUniverse) -> Self {
            Self {
                universe,
                catalog: InMemoryTypeCatalog::new(),
                classifier: TypeClassifier::new(),
                state: CompilerState::default(),
            }
        }

        fn compiler(&mut self) -> PlanCompiler<'_> {
            PlanCompiler::new(&self.universe, &mut self.catalog, &mut self.classifier, &mut self.state)
        }
    }

    #[test]
    fn slot_writers_are_cached_per_formal_type() {
        let mut fx = Fixture::new(TypeUniverse::new());
        let int = fx.universe.primitive(PrimitiveKind::I32);
        let mut compiler = fx.compiler();
        let a = compiler.slot_writer(int).unwrap();
        let b = compiler.slot_writer(int).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(fx.state.cached_writers(), 1);
    }

    #[test]
    fn sealed_field_types_are_cataloged_while_compiling() {
        let mut u = TypeUniverse::new();
        let holder = u.declare_class("Holder").unwrap();
        let string = u.string();
        u.define_fields(holder, vec![FieldDef::new("text", string)]).unwrap();
        let mut fx = Fixture::new(u);
        fx.catalog.index_of(holder).unwrap();

        let plan = fx.compiler().compile_slot(0).unwrap().unwrap();
        assert_eq!(plan.shape(), PlanShape::Fields { count: 1 });
        assert_eq!(plan.label(), "write_Holder");
        assert_eq!(fx.catalog.lookup(string), Some(1));
    }

    #[test]
    fn transient_types_get_no_plan() {
        let mut u = TypeUniverse::new();
        let skip = u.declare_class("Skip").unwrap();
        u.mark_transient(skip).unwrap();
        let mut fx = Fixture::new(u);
        fx.catalog.index_of(skip).unwrap();
        assert!(fx.compiler().compile_slot(0).unwrap().is_none());
    }

    #[test]
    fn unknown_slot_is_missing() {
        let mut fx = Fixture::new(TypeUniverse::new());
        assert!(matches!(fx.compiler().compile_slot(3), Err(EncodeError::MissingPlan(3))));
    }

    #[test]
    fn boxed_value_plan() {
        let mut fx = Fixture::new(TypeUniverse::new());
        let int = fx.universe.primitive(PrimitiveKind::I64);
        fx.catalog.index_of(int).unwrap();
        let plan = fx.compiler().compile_slot(0).unwrap().unwrap();
        assert_eq!(plan.shape(), PlanShape::BoxedValue);
    }
}
