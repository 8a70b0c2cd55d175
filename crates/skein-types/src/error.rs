use thiserror::Error;

use crate::handle::TypeHandle;

/// Errors produced while building or querying the type universe.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown type handle: {0}")]
    UnknownType(TypeHandle),

    #[error("a type named {0:?} is already declared")]
    DuplicateName(String),

    #[error("type {ty:?} declares field {field:?} more than once")]
    DuplicateField { ty: String, field: String },

    #[error("type {0:?} does not carry fields")]
    NotFieldBearing(String),

    #[error("array rank must be at least 1, got {0}")]
    InvalidRank(usize),

    #[error("nullable requires a non-nullable value type, got {0:?}")]
    InvalidNullable(String),

    #[error("enum underlying type must be an integer primitive, got {0}")]
    InvalidEnumUnderlying(&'static str),

    #[error("field index {index} out of range for object with {len} fields")]
    FieldOutOfRange { index: usize, len: usize },
}

pub type TypeResult<T> = Result<T, TypeError>;
