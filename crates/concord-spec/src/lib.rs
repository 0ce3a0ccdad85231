//! OpenAPI 3.x document model and endpoint extraction.
//!
//! Loads YAML/JSON documents (JSON is valid YAML), runs minimal structural
//! checks, and walks the path/operation tree into [`EndpointDefinition`]s
//! with attached schema trees.

pub mod error;
pub mod extract;
pub mod loader;
pub mod model;

pub use error::SpecError;
pub use extract::{extract, ExtractOutcome};
pub use loader::{check_document, load_document, load_document_file, DocumentReport};
pub use model::{
    base_path, normalize_path_template, Document, EndpointDefinition, HttpMethod, Info,
    ParameterSpec,
};
