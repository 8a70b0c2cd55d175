use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kind::PrimitiveKind;

/// Dense index of a type inside a [`TypeUniverse`](crate::TypeUniverse).
///
/// Handles are only meaningful for the universe that issued them. The
/// first handles are fixed: `object`, `string`, then one per
/// [`PrimitiveKind`] in [`PrimitiveKind::ALL`] order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeHandle(u32);

impl TypeHandle {
    /// The open root type every reference type derives from.
    pub const OBJECT: TypeHandle = TypeHandle(0);
    /// The built-in sealed string type.
    pub const STRING: TypeHandle = TypeHandle(1);

    pub(crate) const FIRST_PRIMITIVE: u32 = 2;

    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Handle of the built-in primitive type.
    pub const fn primitive(kind: PrimitiveKind) -> Self {
        Self(Self::FIRST_PRIMITIVE + kind as u32)
    }

    /// Position in the owning universe.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.0)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
