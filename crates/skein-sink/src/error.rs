use thiserror::Error;

/// Errors produced while writing primitives.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("length {len} does not fit the {what} prefix")]
    LengthOverflow { what: &'static str, len: usize },

    #[error("payload encoding failed: {0}")]
    Payload(String),
}

pub type SinkResult<T> = Result<T, SinkError>;
