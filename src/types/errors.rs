//! Error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and keep
//! the underlying `serde_json` / I/O fault as their source.

use thiserror::Error;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for body decoding and response encoding.
#[derive(Error, Debug)]
pub enum Error {
    /// Destination is not a structured record (map to 500, caller defect).
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Body is not a well-formed JSON document of the expected shape (map to 400).
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// A whitelisted fragment does not fit its field's type (map to 400).
    #[error("decode error in field `{field}`: {source}")]
    FieldDecode {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    /// Response payload could not be serialized (map to 500, caller defect).
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// Body exceeds the configured size limit (map to 413).
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors while reading the body or writing the response.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error was caused by the payload rather than the caller.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::FieldDecode { .. })
    }

    /// Name of the field whose fragment failed to decode, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::FieldDecode { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Suggested HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Decode(_) | Error::FieldDecode { .. } | Error::Io(_) => 400,
            Error::BodyTooLarge { .. } => 413,
            Error::TypeMismatch(_) | Error::Encode(_) | Error::Config(_) => 500,
        }
    }
}

// Convenience constructors
impl Error {
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    pub fn decode(source: serde_json::Error) -> Self {
        Self::Decode(source)
    }

    pub fn field_decode(field: impl Into<String>, source: serde_json::Error) -> Self {
        Self::FieldDecode {
            field: field.into(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
