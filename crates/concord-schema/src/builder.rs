//! Builds [`SchemaNode`] trees from raw schema objects.
//!
//! Pure function of the raw map: reference resolution happens one layer
//! above, before this is called. Unresolved `$ref`s are recorded on the
//! node's `reference` field rather than rejected.

use serde_json::Value;

use crate::error::ConstraintError;
use crate::model::{Constraints, SchemaKind, SchemaNode};

/// Build a schema tree from a raw schema value.
///
/// `type` defaults to `string` when unspecified, unless `properties` is
/// present (implies `object`) or `items` is present (implies `array`) —
/// hand-written OpenAPI documents are commonly loose here. The only failure
/// path is an internally-contradictory constraint set.
pub fn build(raw: &Value) -> Result<SchemaNode, ConstraintError> {
    let obj = match raw.as_object() {
        Some(o) => o,
        // Non-object schema values (true/false schemas, nulls) degrade to a
        // bare string node.
        None => return Ok(SchemaNode::new(SchemaKind::String)),
    };

    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(SchemaKind::parse)
        .unwrap_or_else(|| {
            if obj.contains_key("properties") {
                SchemaKind::Object
            } else if obj.contains_key("items") {
                SchemaKind::Array
            } else {
                SchemaKind::String
            }
        });

    let mut node = SchemaNode::new(kind);

    node.reference = obj
        .get("$ref")
        .and_then(Value::as_str)
        .map(str::to_string);
    node.format = obj
        .get("format")
        .and_then(Value::as_str)
        .map(str::to_string);
    node.title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string);
    node.description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        for (name, raw_child) in props {
            node.properties.insert(name.clone(), build(raw_child)?);
        }
    }

    if let Some(raw_items) = obj.get("items") {
        node.items = Some(Box::new(build(raw_items)?));
    }

    if let Some(required) = obj.get("required").and_then(Value::as_array) {
        node.required = required
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }

    node.constraints = Constraints::from_raw(obj)?;

    Ok(node)
}
