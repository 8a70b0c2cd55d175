//! Arrays: `rank`, one length per dimension, then every element in
//! row-major order keyed on the declared element type.

use skein_types::{Body, TypeHandle, Value};

use crate::compiler::PlanCompiler;
use crate::encoder::GraphEncoder;
use crate::error::{EncodeError, EncodeResult};
use crate::plan::{plan_body, PlanFn, SlotWriter};
use crate::strategies::{body_mismatch, write_len};

pub(crate) fn compile(
    compiler: &mut PlanCompiler<'_>,
    ty: TypeHandle,
    element: TypeHandle,
    rank: usize,
) -> EncodeResult<Box<PlanFn>> {
    let element = compiler.slot_writer(element)?;
    let name = compiler.name(ty);
    Ok(plan_body(move |enc, obj| {
        let body = obj.body();
        let Body::Array { lengths, items } = &*body else {
            return Err(body_mismatch(&name, "array", &body));
        };
        check_shape(&name, rank, lengths, items.len())?;
        write_len(enc.sink(), "array rank", rank)?;
        for len in lengths {
            write_len(enc.sink(), "array length", *len)?;
        }
        write_dimension(enc, &element, lengths, items)
    }))
}

fn check_shape(name: &str, rank: usize, lengths: &[usize], count: usize) -> EncodeResult<()> {
    let mismatch = |reason: String| EncodeError::ShapeMismatch {
        ty: name.to_string(),
        reason,
    };
    if lengths.len() != rank {
        return Err(mismatch(format!("{} lengths for rank {rank}", lengths.len())));
    }
    let total = lengths
        .iter()
        .try_fold(1usize, |acc, len| acc.checked_mul(*len))
        .ok_or_else(|| mismatch("element count overflows".into()))?;
    if total != count {
        return Err(mismatch(format!("lengths {lengths:?} need {total} elements, found {count}")));
    }
    Ok(())
}

/// One counting loop per dimension, outermost first.
fn write_dimension(
    enc: &mut GraphEncoder<'_>,
    element: &SlotWriter,
    lengths: &[usize],
    items: &[Value],
) -> EncodeResult<()> {
    let Some((&len, inner)) = lengths.split_first() else {
        return match items.first() {
            Some(item) => element(enc, item),
            None => Ok(()),
        };
    };
    let stride: usize = inner.iter().product();
    for row in items.chunks(stride.max(1)).take(len) {
        write_dimension(enc, element, inner, row)?;
    }
    Ok(())
}
