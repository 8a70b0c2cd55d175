//! Runtime type and object model for the skein object-graph serializer.
//!
//! Rust has no runtime reflection, so the types the encoder discovers at
//! run time are described explicitly in a [`TypeUniverse`]. Objects carry a
//! [`TypeHandle`] naming their runtime type and a [`Body`] holding their
//! data.
//!
//! # Key Types
//!
//! - [`TypeUniverse`] -- registry of [`TypeDef`]s, markers and hooks
//! - [`TypeKind`] -- the closed set of type shapes
//! - [`Value`] -- contents of a single slot
//! - [`ObjRef`] -- shared object with identity; cycles are allowed
//! - [`SelfDescribing`] -- types that write their own bytes

pub mod error;
pub mod handle;
pub mod hooks;
pub mod kind;
pub mod object;
pub mod universe;
pub mod value;

pub use error::{TypeError, TypeResult};
pub use handle::TypeHandle;
pub use hooks::{HookFn, HookKind, HookMember};
pub use kind::{FieldDef, PrimitiveKind, TypeKind};
pub use object::{Body, ObjRef, Object, SelfDescribing};
pub use universe::{TypeDef, TypeUniverse};
pub use value::{StructValue, Value};
