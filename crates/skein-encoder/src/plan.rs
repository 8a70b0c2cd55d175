//! Compiled write plans and the table that holds them.

use std::fmt;
use std::rc::Rc;

use skein_types::{HookMember, ObjRef, TypeHandle, Value};

use crate::compiler::PlanCompiler;
use crate::encoder::GraphEncoder;
use crate::error::{EncodeError, EncodeResult};

/// Body of a plan: encodes one instance of exactly one runtime type.
pub type PlanFn = dyn Fn(&mut GraphEncoder<'_>, &ObjRef) -> EncodeResult<()>;

/// Encodes one slot of a given formal type.
pub type SlotWriter = Rc<dyn Fn(&mut GraphEncoder<'_>, &Value) -> EncodeResult<()>>;

/// Box a closure as a plan body.
pub(crate) fn plan_body<F>(f: F) -> Box<PlanFn>
where
    F: Fn(&mut GraphEncoder<'_>, &ObjRef) -> EncodeResult<()> + 'static,
{
    Box::new(f)
}

/// Wrap a closure as a slot writer.
pub(crate) fn slot_writer<F>(f: F) -> SlotWriter
where
    F: Fn(&mut GraphEncoder<'_>, &Value) -> EncodeResult<()> + 'static,
{
    Rc::new(f)
}

/// Which strategy a plan was compiled from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanShape {
    String,
    SelfDescribing,
    BoxedValue,
    Array { rank: usize },
    Collection,
    Dictionary,
    Fields { count: usize },
}

/// Encoding strategy for one runtime type, compiled once per session.
///
/// Hooks are part of the plan: pre-write hooks run before the body and
/// post-write hooks after it, each group in discovery order.
pub struct WritePlan {
    type_id: i32,
    ty: TypeHandle,
    shape: PlanShape,
    label: String,
    pre_write: Vec<HookMember>,
    post_write: Vec<HookMember>,
    body: Box<PlanFn>,
}

impl WritePlan {
    pub(crate) fn new(
        type_id: i32,
        ty: TypeHandle,
        shape: PlanShape,
        label: String,
        pre_write: Vec<HookMember>,
        post_write: Vec<HookMember>,
        body: Box<PlanFn>,
    ) -> Self {
        Self {
            type_id,
            ty,
            shape,
            label,
            pre_write,
            post_write,
            body,
        }
    }

    /// Catalog id this plan was compiled for.
    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    /// Type this plan writes.
    pub fn ty(&self) -> TypeHandle {
        self.ty
    }

    /// Encoding strategy chosen for the type.
    pub fn shape(&self) -> PlanShape {
        self.shape
    }

    /// Diagnostic name, e.g. `write_Node`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Pre-write plus post-write hooks.
    pub fn hook_count(&self) -> usize {
        self.pre_write.len() + self.post_write.len()
    }

    pub(crate) fn invoke(&self, encoder: &mut GraphEncoder<'_>, obj: &ObjRef) -> EncodeResult<()> {
        for hook in &self.pre_write {
            hook.invoke(obj);
        }
        (self.body)(encoder, obj)?;
        for hook in &self.post_write {
            hook.invoke(obj);
        }
        Ok(())
    }
}

impl fmt::Debug for WritePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WritePlan")
            .field("type_id", &self.type_id)
            .field("ty", &self.ty)
            .field("shape", &self.shape)
            .field("label", &self.label)
            .field("hooks", &self.hook_count())
            .finish()
    }
}

/// Plans indexed by catalog id. `None` marks a transient type.
///
/// The table is never mutated in place: growth builds a new table that
/// shares every existing plan, so a caller holding an older snapshot sees
/// a smaller but consistent view.
#[derive(Clone, Default)]
pub struct PlanTable {
    slots: Rc<[Option<Rc<WritePlan>>]>,
}

impl PlanTable {
    /// Create a table with no slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, one per cataloged type.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no type has been cataloged yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Plan for `type_id`: `Ok(None)` for a transient type, an error when
    /// the id has no slot yet.
    pub fn get(&self, type_id: i32) -> EncodeResult<Option<Rc<WritePlan>>> {
        usize::try_from(type_id)
            .ok()
            .and_then(|i| self.slots.get(i))
            .cloned()
            .ok_or(EncodeError::MissingPlan(type_id))
    }

    /// Copy every compiled slot and compile the rest until the table
    /// matches the catalog, including types cataloged while compiling.
    pub(crate) fn grow(&self, compiler: &mut PlanCompiler<'_>) -> EncodeResult<PlanTable> {
        let mut slots: Vec<Option<Rc<WritePlan>>> = self.slots.to_vec();
        while slots.len() < compiler.catalog_len() {
            let type_id = slots.len() as i32;
            slots.push(compiler.compile_slot(type_id)?.map(Rc::new));
        }
        Ok(PlanTable { slots: slots.into() })
    }

    #[cfg(test)]
    pub(crate) fn ptr_eq_slot(&self, other: &PlanTable, type_id: usize) -> bool {
        match (self.slots.get(type_id), other.slots.get(type_id)) {
            (Some(Some(a)), Some(Some(b))) => Rc::ptr_eq(a, b),
            (Some(None), Some(None)) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for PlanTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.slots.iter()).finish()
    }
}
