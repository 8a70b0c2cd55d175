//! Memoized type classification.
//!
//! A type is transient iff it carries the exclusion marker. Transience is
//! a type-level property: no instance can opt in or out on its own, which
//! is what lets sealed reference slots skip the runtime check.

use std::collections::HashMap;

use skein_types::{TypeHandle, TypeKind, TypeUniverse};

/// How a slot of a given formal type is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerializationType {
    /// Omitted entirely.
    Transient,
    /// Written inline, no identity.
    Value,
    /// Identity-tracked; may be null, shared or cyclic.
    Reference,
}

/// Per-session classifier with a lazily filled transient memo.
#[derive(Debug, Default)]
pub struct TypeClassifier {
    transient: HashMap<TypeHandle, bool>,
}

impl TypeClassifier {
    /// Create a classifier with an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `ty` is excluded from the graph. Computed once per type.
    pub fn is_transient(&mut self, universe: &TypeUniverse, ty: TypeHandle) -> bool {
        *self
            .transient
            .entry(ty)
            .or_insert_with(|| universe.get(ty).map_or(false, |def| def.is_transient()))
    }

    /// How a slot declared with `ty` is written.
    pub fn serialization_type(&mut self, universe: &TypeUniverse, ty: TypeHandle) -> SerializationType {
        if self.is_transient(universe, ty) {
            SerializationType::Transient
        } else if is_value(universe, ty) {
            SerializationType::Value
        } else {
            SerializationType::Reference
        }
    }

    /// Number of memoized answers.
    pub fn memoized(&self) -> usize {
        self.transient.len()
    }
}

/// Whether `ty` is a value type. Unknown handles are not.
pub fn is_value(universe: &TypeUniverse, ty: TypeHandle) -> bool {
    universe.get(ty).map_or(false, |def| def.is_value())
}

/// Whether `ty` has no subtypes. Unknown handles are open.
pub fn is_sealed(universe: &TypeUniverse, ty: TypeHandle) -> bool {
    universe.get(ty).map_or(false, |def| def.is_sealed())
}

/// Whether an instance of `ty` can be rebuilt purely from the data written
/// for it, so that its body may follow its identity id immediately.
pub fn can_be_created_with_data_only(universe: &TypeUniverse, ty: TypeHandle) -> bool {
    let Ok(def) = universe.get(ty) else {
        return false;
    };
    def.is_value()
        || matches!(
            def.kind(),
            TypeKind::String
                | TypeKind::Array { .. }
                | TypeKind::Collection { .. }
                | TypeKind::Dictionary { .. }
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_types::PrimitiveKind;

    #[test]
    fn transient_is_memoized() {
        let mut u = TypeUniverse::new();
        let c = u.declare_class("Cache").unwrap();
        u.mark_transient(c).unwrap();

        let mut classifier = TypeClassifier::new();
        assert!(classifier.is_transient(&u, c));
        assert!(classifier.is_transient(&u, c));
        assert!(!classifier.is_transient(&u, u.string()));
        assert_eq!(classifier.memoized(), 2);
    }

    #[test]
    fn memo_keeps_first_answer() {
        let mut u = TypeUniverse::new();
        let c = u.declare_class("Late").unwrap();
        let mut classifier = TypeClassifier::new();
        assert!(!classifier.is_transient(&u, c));
        u.mark_transient(c).unwrap();
        assert!(!classifier.is_transient(&u, c));
    }

    #[test]
    fn three_way_classification() {
        let mut u = TypeUniverse::new();
        let skip = u.declare_struct("Skip").unwrap();
        u.mark_transient(skip).unwrap();
        let mut classifier = TypeClassifier::new();
        assert_eq!(
            classifier.serialization_type(&u, u.primitive(PrimitiveKind::I32)),
            SerializationType::Value
        );
        assert_eq!(classifier.serialization_type(&u, u.string()), SerializationType::Reference);
        assert_eq!(classifier.serialization_type(&u, skip), SerializationType::Transient);
    }

    #[test]
    fn data_only_shapes() {
        let mut u = TypeUniverse::new();
        let arr = u.array_of(u.string(), 1).unwrap();
        let list = u.list_of(u.string()).unwrap();
        let class = u.declare_class("Plain").unwrap();
        let custom = u.declare_self_describing("Custom").unwrap();
        assert!(can_be_created_with_data_only(&u, u.string()));
        assert!(can_be_created_with_data_only(&u, arr));
        assert!(can_be_created_with_data_only(&u, list));
        assert!(can_be_created_with_data_only(&u, u.primitive(PrimitiveKind::U8)));
        assert!(!can_be_created_with_data_only(&u, class));
        assert!(!can_be_created_with_data_only(&u, custom));
        assert!(!can_be_created_with_data_only(&u, u.object()));
    }

    #[test]
    fn sealedness() {
        let mut u = TypeUniverse::new();
        let arr = u.array_of(u.object(), 1).unwrap();
        assert!(is_sealed(&u, arr));
        assert!(is_sealed(&u, u.string()));
        assert!(!is_sealed(&u, u.object()));
    }
}
