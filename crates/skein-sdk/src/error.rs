use thiserror::Error;

/// Errors returned by the [`Skein`](crate::Skein) facade.
#[derive(Debug, Error)]
pub enum SdkError {
    /// The encoding session failed.
    #[error("encode error: {0}")]
    Encode(#[from] skein_encoder::EncodeError),

    /// Flushing or finishing the byte writer failed.
    #[error("sink error: {0}")]
    Sink(#[from] skein_sink::SinkError),

    /// The known-type list could not seed a catalog.
    #[error("catalog error: {0}")]
    Catalog(#[from] skein_catalog::CatalogError),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A config file could not be parsed or failed validation.
    #[error("invalid config {path}: {reason}")]
    Config { path: String, reason: String },
}

/// Result alias for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;
