//! Route reconciliation: diffing the documented API surface against the
//! implemented route surface.
//!
//! Routes arrive as externally-collected data (`uri`, `methods[]`, `name`,
//! `action`, `middleware[]`); endpoints come from `concord-spec` extraction.
//! The engine matches the two by normalized signature, classifies
//! discrepancies, computes coverage statistics, and attaches similarity-based
//! suggestions for human review.

pub mod engine;
pub mod error;
pub mod result;
pub mod route;
pub mod similarity;

pub use engine::{ReconcileOptions, Reconciler};
pub use error::RouteError;
pub use result::{Mismatch, MismatchKind, Severity, Statistics, ValidationResult};
pub use route::{load_routes, load_routes_file, Route};
pub use similarity::SimilarityConfig;
