use thiserror::Error;

use skein_catalog::CatalogError;
use skein_sink::SinkError;
use skein_types::TypeError;

/// Errors that abort an encoding session.
///
/// There is no recoverable "skip this object" case: any error leaves the
/// stream partially written and poisons the encoder.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The underlying sink failed; propagated unchanged.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// The type catalog or identity tracker ran out of ids.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// An object body could not be read or modified.
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    /// No encoding shape applies to the type.
    #[error("type {ty:?} matches no encoding shape: {reason}")]
    Unclassifiable { ty: String, reason: String },

    /// A pre- or post-write hook takes more than one parameter.
    #[error("hook {hook:?} on {ty:?} declares {params} parameters; hooks take zero or one")]
    HookSignature { ty: String, hook: String, params: usize },

    /// A slot holds a value its declared type cannot carry.
    #[error("slot of type {expected:?} holds a {found} value")]
    ValueMismatch { expected: String, found: &'static str },

    /// An object body does not match the layout its type declares.
    #[error("object of type {ty:?} has a malformed body: {reason}")]
    ShapeMismatch { ty: String, reason: String },

    /// A type id has no slot in the plan table.
    #[error("no plan slot for type id {0}")]
    MissingPlan(i32),

    /// Inline object data nested deeper than `max_depth`.
    #[error("object nesting exceeds {0} levels")]
    DepthExceeded(usize),

    /// The session failed earlier and cannot be reused.
    #[error("encoder already failed; start a new session")]
    Poisoned,

    /// An [`EncoderConfig`](crate::EncoderConfig) failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias for encoder operations.
pub type EncodeResult<T> = Result<T, EncodeError>;
