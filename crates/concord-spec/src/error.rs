use thiserror::Error;

/// Errors produced while loading documents and constructing endpoint
/// definitions (E3001–E3102).
#[derive(Debug, Error)]
pub enum SpecError {
    /// E3001: YAML/JSON parse error.
    #[error("E3001: parse error: {0}")]
    ParseError(String),

    /// E3002: The document root is not an object.
    #[error("E3002: document root must be an object")]
    NotAnObject,

    /// E3003: More than one distinct server base path and no explicit choice.
    #[error("E3003: ambiguous server base path (candidates: {0}); pass an explicit base path")]
    AmbiguousBasePath(String),

    /// E3101: Endpoint path is empty or does not start with '/'.
    #[error("E3101: invalid endpoint path: '{0}'")]
    InvalidPath(String),

    /// E3102: Operation id is empty.
    #[error("E3102: operation id must not be empty")]
    EmptyOperationId,

    /// I/O error reading a document file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
