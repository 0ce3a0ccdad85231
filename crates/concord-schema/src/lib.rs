//! Reference resolution and the schema data model.
//!
//! Resolves internal JSON-pointer `$ref`s against a loaded OpenAPI document
//! (with cycle detection and a bounded cache) and builds immutable
//! [`SchemaNode`] trees from raw schema objects.

pub mod builder;
pub mod error;
pub mod model;
pub mod resolver;

pub use builder::build;
pub use error::{ConstraintError, ResolveError};
pub use model::{Constraints, SchemaKind, SchemaNode, SchemaWarning};
pub use resolver::{Resolver, ResolverCache};
