//! Walks the document's path/operation tree into endpoint definitions.

use serde_json::Value;
use tracing::debug;

use concord_schema::{Resolver, SchemaNode};

use crate::model::{Document, EndpointDefinition, HttpMethod, ParameterSpec};

/// Extraction result: endpoints plus collected document-quality findings.
///
/// A single bad operation is demoted to an error/warning entry; the rest of
/// the document is still analyzed.
#[derive(Debug, Default)]
pub struct ExtractOutcome {
    pub endpoints: Vec<EndpointDefinition>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Extract one endpoint definition per (path, method).
pub fn extract(doc: &Document) -> ExtractOutcome {
    let mut outcome = ExtractOutcome::default();
    let mut resolver = Resolver::new();

    let paths = match doc.paths() {
        Some(p) => p,
        None => return outcome,
    };

    for (path, path_item) in paths {
        let path_obj = match path_item.as_object() {
            Some(o) => o,
            None => {
                outcome
                    .errors
                    .push(format!("path item for '{path}' must be an object"));
                continue;
            }
        };

        // Path-level parameters are inherited by every operation under it.
        let path_params = collect_parameters(path_obj, doc, &mut resolver, &mut outcome.warnings);

        for method in HttpMethod::ALL {
            let op_obj = match path_obj.get(method.key()).and_then(Value::as_object) {
                Some(o) => o,
                // Non-method keys (summary, parameters, extensions) are skipped.
                None => continue,
            };

            let mut parameters = path_params.clone();
            parameters.extend(collect_parameters(
                op_obj,
                doc,
                &mut resolver,
                &mut outcome.warnings,
            ));

            let operation_id = op_obj
                .get("operationId")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| synthesize_operation_id(method, path));

            let mut endpoint = match EndpointDefinition::new(path, method, &operation_id) {
                Ok(e) => e,
                Err(e) => {
                    outcome.errors.push(format!("{method} {path}: {e}"));
                    continue;
                }
            };

            endpoint.summary = op_obj
                .get("summary")
                .and_then(Value::as_str)
                .map(str::to_string);
            endpoint.description = op_obj
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string);
            endpoint.tags = op_obj
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            endpoint.request_schema = request_schema(
                op_obj,
                &parameters,
                doc,
                &mut resolver,
                &mut outcome,
                path,
                method,
            );
            endpoint.parameters = parameters;

            debug!(
                path = %endpoint.path,
                method = %endpoint.method,
                operation_id = %endpoint.operation_id,
                has_schema = endpoint.request_schema.is_some(),
                "extracted endpoint"
            );
            outcome.endpoints.push(endpoint);
        }
    }

    outcome
}

/// Request schema source precedence: `application/json` body schema, any
/// first content-type schema, a synthetic object from non-header parameters,
/// else none.
fn request_schema(
    op_obj: &serde_json::Map<String, Value>,
    parameters: &[ParameterSpec],
    doc: &Document,
    resolver: &mut Resolver,
    outcome: &mut ExtractOutcome,
    path: &str,
    method: HttpMethod,
) -> Option<SchemaNode> {
    let raw = body_schema(op_obj).or_else(|| synthetic_parameter_schema(parameters))?;

    let expanded = match resolver.expand_node(&raw, doc.raw()) {
        Ok(v) => v,
        Err(e) => {
            // Unresolvable reference: the endpoint survives without a schema.
            outcome
                .warnings
                .push(format!("{method} {path}: {e}"));
            return None;
        }
    };

    match concord_schema::build(&expanded) {
        Ok(node) => Some(node),
        Err(e) => {
            outcome.errors.push(format!("{method} {path}: {e}"));
            None
        }
    }
}

/// The schema under `requestBody.content`, JSON-first.
fn body_schema(op_obj: &serde_json::Map<String, Value>) -> Option<Value> {
    let content = op_obj
        .get("requestBody")?
        .get("content")?
        .as_object()?;

    if let Some(schema) = content
        .get("application/json")
        .and_then(|m| m.get("schema"))
    {
        return Some(schema.clone());
    }
    content
        .values()
        .find_map(|media| media.get("schema").cloned())
}

/// Build an object schema from query/path parameters when there is no body.
fn synthetic_parameter_schema(parameters: &[ParameterSpec]) -> Option<Value> {
    let eligible: Vec<&ParameterSpec> = parameters
        .iter()
        .filter(|p| p.location != "header" && p.location != "cookie")
        .collect();
    if eligible.is_empty() {
        return None;
    }

    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    for param in eligible {
        let schema = param
            .schema
            .clone()
            .unwrap_or_else(|| serde_json::json!({"type": "string"}));
        properties.insert(param.name.clone(), schema);
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
    }

    let mut obj = serde_json::Map::new();
    obj.insert("type".to_string(), Value::String("object".to_string()));
    obj.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        obj.insert("required".to_string(), Value::Array(required));
    }
    Some(Value::Object(obj))
}

/// Parameters from a path item or operation object, `$ref` entries resolved.
fn collect_parameters(
    obj: &serde_json::Map<String, Value>,
    doc: &Document,
    resolver: &mut Resolver,
    warnings: &mut Vec<String>,
) -> Vec<ParameterSpec> {
    let entries = match obj.get("parameters").and_then(Value::as_array) {
        Some(a) => a,
        None => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| {
            let resolved;
            let entry = if let Some(r) = entry.get("$ref").and_then(Value::as_str) {
                match resolver.resolve(r, doc.raw()) {
                    Ok(v) => {
                        resolved = v;
                        &resolved
                    }
                    Err(e) => {
                        warnings.push(e.to_string());
                        return None;
                    }
                }
            } else {
                entry
            };
            serde_json::from_value::<ParameterSpec>(entry.clone()).ok()
        })
        .collect()
}

/// Deterministic operationId from method + path.
///
/// Parameter segments become `Id`; every segment is PascalCased and
/// concatenated after the lowercase method. `GET /users/{userId}/posts`
/// yields `getUsersIdPosts`. Stability matters: the synthesized id doubles
/// as the default generated-artifact name across re-runs.
pub fn synthesize_operation_id(method: HttpMethod, path: &str) -> String {
    let mut id = method.key().to_string();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with('{') {
            id.push_str("Id");
        } else {
            id.push_str(&pascal_case(segment));
        }
    }
    id
}

fn pascal_case(segment: &str) -> String {
    segment
        .split(['-', '_', '.'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
