use thiserror::Error;

/// Errors loading the externally-collected route list (E4001–E4002).
#[derive(Debug, Error)]
pub enum RouteError {
    /// E4001: Route list JSON parse error.
    #[error("E4001: route list parse error: {0}")]
    ParseError(String),

    /// E4002: Route list is not a JSON array.
    #[error("E4002: route list must be a JSON array")]
    NotAnArray,

    /// I/O error reading the route list file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
