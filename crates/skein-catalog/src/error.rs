use thiserror::Error;

use skein_types::TypeHandle;

/// Errors raised by type catalogs and identity trackers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No `i32` id is left for a new type.
    #[error("type catalog is full: cannot assign an id to {0}")]
    CatalogFull(TypeHandle),

    /// No `i32` id is left for a new object.
    #[error("identity tracker is full: more than {0} objects in one session")]
    IdentityExhausted(usize),

    /// A seed list names the same type more than once.
    #[error("type {ty} seeded twice (ids {first} and {second})")]
    DuplicateSeed { ty: TypeHandle, first: i32, second: i32 },
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
