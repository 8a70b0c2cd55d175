use skein_types::{ObjRef, TypeHandle};

use crate::error::CatalogResult;

/// Bidirectional mapping between runtime types and dense ids.
///
/// Implementations must satisfy:
/// - ids are assigned densely from 0 in first-request order
/// - an id, once assigned, never changes and is never reused
/// - the catalog never shrinks during a session
pub trait TypeCatalog {
    /// Id of `ty`, assigning the next free id on first request.
    fn index_of(&mut self, ty: TypeHandle) -> CatalogResult<i32>;

    /// Id of `ty` if already assigned. Never grows the catalog.
    fn lookup(&self, ty: TypeHandle) -> Option<i32>;

    /// Type assigned to `id`.
    fn type_at(&self, id: i32) -> Option<TypeHandle>;

    /// Number of assigned ids.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of identifying an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identified {
    pub id: i32,
    /// `true` only for the call that assigned `id`.
    pub first_seen: bool,
}

/// Stable per-instance ids for reference objects.
///
/// The same instance (by identity, never by value) always yields the same
/// id within a session. Ids are dense from 0 in first-seen order.
pub trait IdentityTracker {
    fn identify(&mut self, obj: &ObjRef) -> CatalogResult<Identified>;

    /// Object that was assigned `id`.
    fn object(&self, id: i32) -> Option<ObjRef>;

    /// Number of identified objects.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
