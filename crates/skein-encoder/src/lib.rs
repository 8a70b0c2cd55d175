//! Write side of the skein object-graph serializer.
//!
//! Given a root object, the [`GraphEncoder`] produces a byte stream that
//! records enough type and identity information to rebuild an equivalent
//! graph: values are written inline, reference objects get an identity
//! id so sharing and cycles survive, and transient types are left out.
//!
//! Each runtime type is compiled once into a [`WritePlan`] the first time
//! it is cataloged. Plans live in a [`PlanTable`] indexed by catalog id
//! that only ever grows.
//!
//! # Stream layout
//!
//! | Record | Layout |
//! |---|---|
//! | object | `typeId` then plan body |
//! | null reference | `-1` |
//! | reference | `typeId` `identityId` `[body on first inlinable use]` |
//! | reference to a transient type | `typeId` |
//! | array | `rank` `length x rank` `elements, row-major` |
//! | collection | `count` `elements` |
//! | dictionary | `count` `(key, value) x count` |
//! | nullable | `hasValue` `[value]` |
//! | self-describing | its own bytes, then `byteLength: i64` |
//!
//! # Key Types
//!
//! - [`GraphEncoder`] -- session entry point
//! - [`TypeClassifier`] -- memoized transient / value / reference split
//! - [`WritePlan`] / [`PlanTable`] -- compiled per-type strategies
//! - [`EncoderConfig`] -- session settings, loadable from TOML

pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod plan;

mod compiler;
mod strategies;

pub use classifier::{SerializationType, TypeClassifier};
pub use config::{EncoderConfig, DEFAULT_MAX_DEPTH};
pub use encoder::{GraphEncoder, SessionCallbacks};
pub use error::{EncodeError, EncodeResult};
pub use plan::{PlanShape, PlanTable, WritePlan};
pub use strategies::reference::NULL_REFERENCE;
