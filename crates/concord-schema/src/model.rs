use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::ConstraintError;

/// The schema type keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl SchemaKind {
    /// Parse an OpenAPI `type` keyword. Returns `None` for unknown types.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }
}

/// Declarative validation constraints attached to a schema node.
///
/// All fields are optional; the whole value is absent when the raw schema
/// carries none of the constraint keywords (distinguishing "no constraints"
/// from "empty constraints" for fast-path checks).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Constraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub pattern: Option<String>,
    pub enum_values: Option<Vec<Value>>,
    pub multiple_of: Option<f64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
}

/// The schema keywords that trigger construction of a [`Constraints`] value.
pub const CONSTRAINT_KEYS: &[&str] = &[
    "minLength",
    "maxLength",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "pattern",
    "enum",
    "multipleOf",
    "minItems",
    "maxItems",
    "uniqueItems",
];

impl Constraints {
    /// Build constraints from a raw schema object.
    ///
    /// Returns `Ok(None)` when no constraint keyword is present. The OpenAPI
    /// 3.0 boolean form of `exclusiveMinimum`/`exclusiveMaximum` is
    /// normalized to the numeric form by copying the companion inclusive
    /// bound. Internally-contradictory bounds fail construction.
    pub fn from_raw(obj: &serde_json::Map<String, Value>) -> Result<Option<Self>, ConstraintError> {
        if !CONSTRAINT_KEYS.iter().any(|k| obj.contains_key(*k)) {
            return Ok(None);
        }

        let get_u64 = |key: &str| obj.get(key).and_then(Value::as_u64);
        let get_f64 = |key: &str| obj.get(key).and_then(Value::as_f64);

        let minimum = get_f64("minimum");
        let maximum = get_f64("maximum");

        // OpenAPI 3.1 uses numeric exclusive bounds; 3.0 uses a boolean paired
        // with the inclusive bound. Normalize the boolean form here.
        let exclusive_minimum = match obj.get("exclusiveMinimum") {
            Some(Value::Bool(true)) => minimum,
            Some(Value::Bool(false)) | None => None,
            Some(v) => v.as_f64(),
        };
        let exclusive_maximum = match obj.get("exclusiveMaximum") {
            Some(Value::Bool(true)) => maximum,
            Some(Value::Bool(false)) | None => None,
            Some(v) => v.as_f64(),
        };

        // When the 3.0 boolean form consumed the inclusive bound, drop it so
        // the inclusive and exclusive bounds don't both fire downstream.
        let bool_min = matches!(obj.get("exclusiveMinimum"), Some(Value::Bool(true)));
        let bool_max = matches!(obj.get("exclusiveMaximum"), Some(Value::Bool(true)));
        let minimum = if bool_min { None } else { minimum };
        let maximum = if bool_max { None } else { maximum };

        let constraints = Self {
            min_length: get_u64("minLength"),
            max_length: get_u64("maxLength"),
            minimum,
            maximum,
            exclusive_minimum,
            exclusive_maximum,
            pattern: obj
                .get("pattern")
                .and_then(Value::as_str)
                .map(str::to_string),
            enum_values: obj
                .get("enum")
                .and_then(Value::as_array)
                .map(|a| a.to_vec()),
            multiple_of: get_f64("multipleOf"),
            min_items: get_u64("minItems"),
            max_items: get_u64("maxItems"),
            unique_items: obj
                .get("uniqueItems")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        };

        constraints.check()?;
        Ok(Some(constraints))
    }

    /// Enforce internal consistency.
    fn check(&self) -> Result<(), ConstraintError> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(ConstraintError::LengthBounds { min, max });
            }
        }
        if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
            if min > max {
                return Err(ConstraintError::NumericBounds { min, max });
            }
        }
        if let (Some(min), Some(max)) = (self.exclusive_minimum, self.exclusive_maximum) {
            if min >= max {
                return Err(ConstraintError::ExclusiveBounds { min, max });
            }
        }
        if let Some(m) = self.multiple_of {
            if m <= 0.0 {
                return Err(ConstraintError::NonPositiveMultipleOf(m));
            }
        }
        if let (Some(min), Some(max)) = (self.min_items, self.max_items) {
            if min > max {
                return Err(ConstraintError::ItemBounds { min, max });
            }
        }
        Ok(())
    }
}

/// A non-fatal finding from [`SchemaNode::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaWarning {
    /// Dot-path of the offending node ("" for the root).
    pub path: String,
    pub message: String,
}

/// An immutable schema tree node.
///
/// Construction is permissive: structurally questionable input (an array
/// without `items`, a `required` name with no matching property) builds fine
/// and is surfaced by [`validate`](Self::validate) instead, because malformed
/// documents are common and partial analysis is still useful. No node is
/// mutated after creation; transformations produce new trees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    /// The original `$ref` string when this node is still unresolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaNode {
    /// An empty node of the given kind.
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            format: None,
            properties: IndexMap::new(),
            items: None,
            required: Vec::new(),
            constraints: None,
            reference: None,
            title: None,
            description: None,
        }
    }

    /// Whether `name` is in this node's required set.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Longest chain through `properties` and `items`, counting this node.
    pub fn max_depth(&self) -> usize {
        let child_max = self
            .properties
            .values()
            .map(SchemaNode::max_depth)
            .chain(self.items.as_deref().map(SchemaNode::max_depth))
            .max()
            .unwrap_or(0);
        1 + child_max
    }

    /// Nesting level counting object-property nesting only.
    pub fn nesting_level(&self) -> usize {
        let child_max = self
            .properties
            .values()
            .map(SchemaNode::nesting_level)
            .chain(self.items.as_deref().map(SchemaNode::nesting_level))
            .max()
            .unwrap_or(0);
        if self.kind == SchemaKind::Object {
            1 + child_max
        } else {
            child_max
        }
    }

    /// Whether any `$ref` chain in the tree points back at itself.
    ///
    /// Returns a boolean rather than an error: circularity is a reportable
    /// condition, not a fatal one.
    pub fn has_circular_reference(&self) -> bool {
        let mut seen = HashSet::new();
        self.circular_walk(&mut seen)
    }

    fn circular_walk(&self, seen: &mut HashSet<String>) -> bool {
        let pushed = if let Some(r) = &self.reference {
            if !seen.insert(r.clone()) {
                return true;
            }
            true
        } else {
            false
        };

        let found = self
            .properties
            .values()
            .any(|child| child.circular_walk(seen))
            || self
                .items
                .as_deref()
                .is_some_and(|items| items.circular_walk(seen));

        if pushed {
            if let Some(r) = &self.reference {
                seen.remove(r);
            }
        }
        found
    }

    /// Structural validation pass. Returns warnings only; construction never
    /// rejects these shapes.
    pub fn validate(&self) -> Vec<SchemaWarning> {
        let mut warnings = Vec::new();
        self.validate_at("", &mut warnings);
        warnings
    }

    fn validate_at(&self, path: &str, warnings: &mut Vec<SchemaWarning>) {
        if self.kind == SchemaKind::Array && self.items.is_none() && self.reference.is_none() {
            warnings.push(SchemaWarning {
                path: path.to_string(),
                message: "array schema has no 'items'".to_string(),
            });
        }

        for name in &self.required {
            if !self.properties.contains_key(name) {
                warnings.push(SchemaWarning {
                    path: path.to_string(),
                    message: format!("required property '{name}' is not declared in 'properties'"),
                });
            }
        }

        for (name, child) in &self.properties {
            let child_path = if path.is_empty() {
                name.clone()
            } else {
                format!("{path}.{name}")
            };
            child.validate_at(&child_path, warnings);
        }
        if let Some(items) = &self.items {
            let items_path = if path.is_empty() {
                "*".to_string()
            } else {
                format!("{path}.*")
            };
            items.validate_at(&items_path, warnings);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn absent_constraint_keys_build_nothing() {
        let obj = raw(json!({"type": "string", "format": "email"}));
        assert!(Constraints::from_raw(&obj).unwrap().is_none());
    }

    #[test]
    fn boolean_exclusive_minimum_copies_inclusive_bound() {
        let obj = raw(json!({"exclusiveMinimum": true, "minimum": 5}));
        let c = Constraints::from_raw(&obj).unwrap().unwrap();
        assert_eq!(c.exclusive_minimum, Some(5.0));
        // The inclusive bound was consumed by the normalization.
        assert_eq!(c.minimum, None);
    }

    #[test]
    fn numeric_exclusive_bounds_pass_through() {
        let obj = raw(json!({"exclusiveMinimum": 1, "exclusiveMaximum": 10}));
        let c = Constraints::from_raw(&obj).unwrap().unwrap();
        assert_eq!(c.exclusive_minimum, Some(1.0));
        assert_eq!(c.exclusive_maximum, Some(10.0));
    }

    #[test]
    fn contradictory_length_bounds_fail_construction() {
        let obj = raw(json!({"minLength": 10, "maxLength": 2}));
        assert!(matches!(
            Constraints::from_raw(&obj),
            Err(ConstraintError::LengthBounds { min: 10, max: 2 })
        ));
    }

    #[test]
    fn non_positive_multiple_of_fails_construction() {
        let obj = raw(json!({"multipleOf": 0}));
        assert!(matches!(
            Constraints::from_raw(&obj),
            Err(ConstraintError::NonPositiveMultipleOf(_))
        ));
    }

    #[test]
    fn array_without_items_warns_not_fails() {
        let node = SchemaNode::new(SchemaKind::Array);
        let warnings = node.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("items"));
    }

    #[test]
    fn required_name_missing_from_properties_warns() {
        let mut node = SchemaNode::new(SchemaKind::Object);
        node.required.push("ghost".to_string());
        let warnings = node.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("ghost"));
    }

    #[test]
    fn max_depth_counts_properties_and_items() {
        let mut leaf = SchemaNode::new(SchemaKind::String);
        leaf.format = Some("email".to_string());
        let mut arr = SchemaNode::new(SchemaKind::Array);
        arr.items = Some(Box::new(leaf));
        let mut root = SchemaNode::new(SchemaKind::Object);
        root.properties.insert("tags".to_string(), arr);

        assert_eq!(root.max_depth(), 3);
        assert_eq!(root.nesting_level(), 1);
    }

    #[test]
    fn sibling_references_are_not_circular() {
        let mut a = SchemaNode::new(SchemaKind::Object);
        a.reference = Some("#/components/schemas/Shared".to_string());
        let b = a.clone();
        let mut root = SchemaNode::new(SchemaKind::Object);
        root.properties.insert("a".to_string(), a);
        root.properties.insert("b".to_string(), b);

        assert!(!root.has_circular_reference());
    }

    #[test]
    fn nested_self_reference_is_circular() {
        let mut inner = SchemaNode::new(SchemaKind::Object);
        inner.reference = Some("#/components/schemas/Node".to_string());
        let mut outer = SchemaNode::new(SchemaKind::Object);
        outer.reference = Some("#/components/schemas/Node".to_string());
        outer.properties.insert("child".to_string(), inner);

        assert!(outer.has_circular_reference());
    }
}
