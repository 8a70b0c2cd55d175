use std::collections::HashMap;

use tracing::trace;

use skein_types::TypeHandle;

use crate::error::{CatalogError, CatalogResult};
use crate::traits::TypeCatalog;

/// `Vec` + `HashMap` type catalog.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTypeCatalog {
    types: Vec<TypeHandle>,
    ids: HashMap<TypeHandle, i32>,
}

impl InMemoryTypeCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a preexisting assignment, in id order.
    pub fn seeded(types: impl IntoIterator<Item = TypeHandle>) -> CatalogResult<Self> {
        let mut catalog = Self::new();
        for ty in types {
            let next = catalog.types.len() as i32;
            if let Some(&first) = catalog.ids.get(&ty) {
                return Err(CatalogError::DuplicateSeed { ty, first, second: next });
            }
            catalog.index_of(ty)?;
        }
        Ok(catalog)
    }

    /// Types in id order.
    pub fn types(&self) -> &[TypeHandle] {
        &self.types
    }
}

impl TypeCatalog for InMemoryTypeCatalog {
    fn index_of(&mut self, ty: TypeHandle) -> CatalogResult<i32> {
        if let Some(&id) = self.ids.get(&ty) {
            return Ok(id);
        }
        let id = i32::try_from(self.types.len()).map_err(|_| CatalogError::CatalogFull(ty))?;
        self.types.push(ty);
        self.ids.insert(ty, id);
        trace!(%ty, id, "type cataloged");
        Ok(id)
    }

    fn lookup(&self, ty: TypeHandle) -> Option<i32> {
        self.ids.get(&ty).copied()
    }

    fn type_at(&self, id: i32) -> Option<TypeHandle> {
        usize::try_from(id).ok().and_then(|i| self.types.get(i)).copied()
    }

    fn len(&self) -> usize {
        self.types.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_types::PrimitiveKind;

    #[test]
    fn ids_are_dense_and_stable() {
        let mut c = InMemoryTypeCatalog::new();
        let a = TypeHandle::STRING;
        let b = TypeHandle::primitive(PrimitiveKind::I32);
        assert_eq!(c.index_of(a).unwrap(), 0);
        assert_eq!(c.index_of(b).unwrap(), 1);
        assert_eq!(c.index_of(a).unwrap(), 0);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn lookup_does_not_grow() {
        let mut c = InMemoryTypeCatalog::new();
        assert_eq!(c.lookup(TypeHandle::OBJECT), None);
        assert!(c.is_empty());
        c.index_of(TypeHandle::OBJECT).unwrap();
        assert_eq!(c.lookup(TypeHandle::OBJECT), Some(0));
    }

    #[test]
    fn type_at_roundtrip() {
        let mut c = InMemoryTypeCatalog::new();
        let id = c.index_of(TypeHandle::STRING).unwrap();
        assert_eq!(c.type_at(id), Some(TypeHandle::STRING));
        assert_eq!(c.type_at(-1), None);
        assert_eq!(c.type_at(5), None);
    }

    #[test]
    fn seeded_keeps_order() {
        let c = InMemoryTypeCatalog::seeded([TypeHandle::STRING, TypeHandle::OBJECT]).unwrap();
        assert_eq!(c.lookup(TypeHandle::STRING), Some(0));
        assert_eq!(c.lookup(TypeHandle::OBJECT), Some(1));
        assert_eq!(c.types(), &[TypeHandle::STRING, TypeHandle::OBJECT]);
    }

    #[test]
    fn seeded_rejects_duplicates() {
        let err = InMemoryTypeCatalog::seeded([TypeHandle::STRING, TypeHandle::STRING]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateSeed { ty: TypeHandle::STRING, first: 0, second: 1 }
        );
    }
}
