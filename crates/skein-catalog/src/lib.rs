//! Type catalog and object identity tracking.
//!
//! Both collaborators grow monotonically for the life of an encoding
//! session and are discarded with it.
//!
//! - [`TypeCatalog`] / [`InMemoryTypeCatalog`] -- runtime type to dense id
//! - [`IdentityTracker`] / [`ObjectIdentifier`] -- object instance to dense id

pub mod catalog;
pub mod error;
pub mod identity;
pub mod traits;

pub use catalog::InMemoryTypeCatalog;
pub use error::{CatalogError, CatalogResult};
pub use identity::ObjectIdentifier;
pub use traits::{Identified, IdentityTracker, TypeCatalog};
