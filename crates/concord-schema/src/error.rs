use thiserror::Error;

/// Errors produced during reference resolution (E2001–E2003).
///
/// These are raised at the point of resolution: the caller cannot
/// meaningfully build a node whose reference target is unknown. Callers
/// that can tolerate a missing reference catch and convert to a boolean.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// E2001: Reference is not an internal `#/...` pointer.
    #[error("E2001: invalid reference format: '{0}' (only internal '#/...' pointers are supported)")]
    InvalidFormat(String),

    /// E2002: A pointer segment does not exist in the document.
    #[error("E2002: reference not found: '{0}'")]
    NotFound(String),

    /// E2003: The reference is already being resolved further up the stack.
    #[error("E2003: circular reference detected: '{0}'")]
    CircularReference(String),
}

/// Internally-contradictory constraint sets (E2101–E2105).
///
/// These always fail construction: a schema declaring `minLength > maxLength`
/// is self-contradictory, not merely malformed input.
#[derive(Debug, Error)]
pub enum ConstraintError {
    /// E2101: `minLength` exceeds `maxLength`.
    #[error("E2101: minLength {min} exceeds maxLength {max}")]
    LengthBounds { min: u64, max: u64 },

    /// E2102: `minimum` exceeds `maximum`.
    #[error("E2102: minimum {min} exceeds maximum {max}")]
    NumericBounds { min: f64, max: f64 },

    /// E2103: `exclusiveMinimum` is not strictly below `exclusiveMaximum`.
    #[error("E2103: exclusiveMinimum {min} must be less than exclusiveMaximum {max}")]
    ExclusiveBounds { min: f64, max: f64 },

    /// E2104: `multipleOf` must be a positive number.
    #[error("E2104: multipleOf must be positive, got {0}")]
    NonPositiveMultipleOf(f64),

    /// E2105: `minItems` exceeds `maxItems`.
    #[error("E2105: minItems {min} exceeds maxItems {max}")]
    ItemBounds { min: u64, max: u64 },
}
