//! Field-by-field layout shared by classes and plain structs.

use skein_types::{FieldDef, TypeHandle, Value};

use crate::compiler::PlanCompiler;
use crate::encoder::GraphEncoder;
use crate::error::{EncodeError, EncodeResult};
use crate::plan::SlotWriter;

/// Encoded fields of one type: sorted by name, transient fields and
/// fields of transient type dropped without a placeholder.
pub(crate) struct FieldLayout {
    owner: String,
    declared: usize,
    order: Vec<(usize, SlotWriter)>,
}

impl FieldLayout {
    pub(crate) fn compile(
        compiler: &mut PlanCompiler<'_>,
        owner: TypeHandle,
        fields: &[FieldDef],
    ) -> EncodeResult<Self> {
        let mut sorted: Vec<(usize, &FieldDef)> = fields.iter().enumerate().collect();
        sorted.sort_by(|(_, a), (_, b)| a.name.as_bytes().cmp(b.name.as_bytes()));

        let mut order = Vec::with_capacity(sorted.len());
        for (index, field) in sorted {
            if field.transient || compiler.is_transient(field.ty) {
                continue;
            }
            order.push((index, compiler.slot_writer(field.ty)?));
        }
        Ok(Self {
            owner: compiler.name(owner),
            declared: fields.len(),
            order,
        })
    }

    /// Number of fields actually encoded.
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn declared(&self) -> usize {
        self.declared
    }

    /// Write `values` (declaration order) in encoded order.
    pub(crate) fn write(&self, enc: &mut GraphEncoder<'_>, values: &[Value]) -> EncodeResult<()> {
        if values.len() != self.declared {
            return Err(EncodeError::ShapeMismatch {
                ty: self.owner.clone(),
                reason: format!("{} field values for {} declared fields", values.len(), self.declared),
            });
        }
        for (index, writer) in &self.order {
            writer(enc, &values[*index])?;
        }
        Ok(())
    }
}
