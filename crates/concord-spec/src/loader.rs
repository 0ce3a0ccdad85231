//! Document loading boundary and structural quality checks.

use serde_json::Value;

use concord_schema::{ResolveError, Resolver};

use crate::error::SpecError;
use crate::model::Document;

/// Nesting depth above which a component schema is reported.
const MAX_SCHEMA_DEPTH: usize = 32;

/// Parse a YAML or JSON document string.
///
/// Only the parse itself and the root shape are hard failures here; every
/// other structural problem is collected by [`check_document`] so a single
/// bad section never aborts analysis of the rest.
pub fn load_document(input: &str) -> Result<Document, SpecError> {
    let raw: Value =
        serde_yaml::from_str(input).map_err(|e| SpecError::ParseError(e.to_string()))?;
    Document::new(raw)
}

/// Read and parse a document file.
pub fn load_document_file(path: &std::path::Path) -> Result<Document, SpecError> {
    let content = std::fs::read_to_string(path)?;
    load_document(&content)
}

/// Document-quality findings: best-effort, never thrown.
#[derive(Debug, Clone, Default)]
pub struct DocumentReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl DocumentReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Minimal structural checks over a loaded document.
pub fn check_document(doc: &Document) -> DocumentReport {
    let mut report = DocumentReport::default();

    match doc.openapi_version() {
        None => report
            .errors
            .push("missing 'openapi' version field".to_string()),
        Some(v) if !v.starts_with("3.") => report
            .errors
            .push(format!("unsupported OpenAPI version: {v} (only 3.x supported)")),
        Some(_) => {}
    }

    match doc.info() {
        None => report.errors.push("missing 'info' object".to_string()),
        Some(info) => {
            if info.title.is_empty() {
                report.warnings.push("'info.title' is empty".to_string());
            }
            if info.version.is_empty() {
                report.warnings.push("'info.version' is empty".to_string());
            }
        }
    }

    if doc.paths().is_none() {
        report.errors.push("missing 'paths' object".to_string());
    }

    if let Some(schemas) = doc.component_schemas() {
        let mut resolver = Resolver::new();
        for (name, raw_schema) in schemas {
            match concord_schema::build(raw_schema) {
                Ok(node) => {
                    if node.max_depth() > MAX_SCHEMA_DEPTH {
                        report.warnings.push(format!(
                            "schema '{name}' exceeds nesting depth {MAX_SCHEMA_DEPTH}"
                        ));
                    }
                }
                Err(e) => report.errors.push(format!("schema '{name}': {e}")),
            }

            // Cycle detection must go through the resolver: the raw tree of a
            // component sees its own pointer zero times, so a self-reference
            // only shows up once resolution pushes the pointer on the stack.
            match resolver.resolve(&component_pointer(name), doc.raw()) {
                Ok(_) => {}
                Err(ResolveError::CircularReference(_)) => report
                    .warnings
                    .push(format!("schema '{name}' contains a circular reference")),
                Err(e) => report.warnings.push(format!("schema '{name}': {e}")),
            }
        }
    }

    report
}

/// JSON pointer to a named component schema, pointer escapes applied.
fn component_pointer(name: &str) -> String {
    let escaped = name.replace('~', "~0").replace('/', "~1");
    format!("#/components/schemas/{escaped}")
}
