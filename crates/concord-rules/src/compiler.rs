use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use concord_schema::{SchemaKind, SchemaNode};

/// Recognized compiler configuration.
///
/// Legacy key names (`authorize`, `messages`, `attributes`) are accepted as
/// serde aliases of the canonical fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Expression emitted into the generated `authorize()` body, if any.
    #[serde(alias = "authorize", skip_serializing_if = "Option::is_none")]
    pub authorization_expression: Option<String>,
    /// Field-or-rule keyed message overrides.
    #[serde(alias = "messages", skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_messages: BTreeMap<String, String>,
    /// Field display-name overrides.
    #[serde(alias = "attributes", skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_attributes: BTreeMap<String, String>,
}

/// One atomic rule: a single token bound to a field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub field: String,
    pub token: String,
}

/// A pattern that failed the best-effort regex sanity check.
///
/// The rule is still emitted — downstream rule engines may tolerate patterns
/// this compiler cannot fully validate.
#[derive(Debug, Clone, Serialize)]
pub struct PatternWarning {
    pub field: String,
    pub pattern: String,
    pub message: String,
}

/// The first atomic rule token for a field, if the field has any.
///
/// A field usually compiles to several tokens; callers that only care about
/// the leading presence/type token use this instead of splitting strings.
pub fn first_token_for<'a>(rules: &'a [Rule], field: &str) -> Option<&'a str> {
    rules
        .iter()
        .find(|r| r.field == field)
        .map(|r| r.token.as_str())
}

/// Translates schema trees into ordered rule maps.
///
/// Pure over the schema tree: compiling the same tree twice yields identical
/// maps. Never fails on schema content; questionable patterns go to the
/// [`pattern_warnings`](Self::pattern_warnings) side channel.
#[derive(Debug, Default)]
pub struct RuleCompiler {
    options: CompilerOptions,
    pattern_warnings: Vec<PatternWarning>,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            options,
            pattern_warnings: Vec::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Warnings accumulated across compilations.
    pub fn pattern_warnings(&self) -> &[PatternWarning] {
        &self.pattern_warnings
    }

    /// Compile a schema tree into `field path -> pipe-joined rule string`.
    pub fn compile(&mut self, node: &SchemaNode, field_path: &str) -> IndexMap<String, String> {
        let mut fields = IndexMap::new();
        self.collect(node, field_path, &mut fields);
        fields
            .into_iter()
            .map(|(field, tokens)| (field, dedup(tokens).join("|")))
            .collect()
    }

    /// Compile into one [`Rule`] per atomic token, for targets that need
    /// rule-level metadata rather than a joined string.
    pub fn compile_individual(&mut self, node: &SchemaNode, field_path: &str) -> Vec<Rule> {
        let mut fields = IndexMap::new();
        self.collect(node, field_path, &mut fields);
        fields
            .into_iter()
            .flat_map(|(field, tokens)| {
                dedup(tokens).into_iter().map(move |token| Rule {
                    field: field.clone(),
                    token,
                })
            })
            .collect()
    }

    fn collect(
        &mut self,
        node: &SchemaNode,
        field_path: &str,
        out: &mut IndexMap<String, Vec<String>>,
    ) {
        match node.kind {
            SchemaKind::Object => {
                if !field_path.is_empty() {
                    // The target rule language validates nested maps with `array`.
                    let mut tokens = vec!["array".to_string()];
                    tokens.extend(self.array_constraint_tokens(node));
                    out.entry(field_path.to_string()).or_default().extend(tokens);
                }
                for (name, child) in &node.properties {
                    let child_path = join_path(field_path, name);
                    self.collect(child, &child_path, out);
                    // The required set lives on the parent, so the presence
                    // qualifier is injected one level above where the child's
                    // own rules are generated.
                    let presence = if node.is_required(name) {
                        "required"
                    } else {
                        "nullable"
                    };
                    out.entry(child_path)
                        .or_default()
                        .insert(0, presence.to_string());
                }
            }
            SchemaKind::Array => {
                if !field_path.is_empty() {
                    let mut tokens = vec!["array".to_string()];
                    tokens.extend(self.array_constraint_tokens(node));
                    out.entry(field_path.to_string()).or_default().extend(tokens);
                }
                if let Some(items) = &node.items {
                    let item_path = join_path(field_path, "*");
                    self.collect(items, &item_path, out);
                }
            }
            _ => {
                let tokens = self.scalar_tokens(node, field_path);
                out.entry(field_path.to_string()).or_default().extend(tokens);
            }
        }
    }

    fn array_constraint_tokens(&self, node: &SchemaNode) -> Vec<String> {
        let mut tokens = Vec::new();
        if let Some(c) = &node.constraints {
            if let Some(min) = c.min_items {
                tokens.push(format!("min:{min}"));
            }
            if let Some(max) = c.max_items {
                tokens.push(format!("max:{max}"));
            }
            if c.unique_items {
                tokens.push("distinct".to_string());
            }
        }
        tokens
    }

    /// Token order for scalars is fixed: type, format, bounds, pattern,
    /// multipleOf, enum.
    fn scalar_tokens(&mut self, node: &SchemaNode, field_path: &str) -> Vec<String> {
        let mut tokens = Vec::new();

        tokens.push(
            match node.kind {
                SchemaKind::Integer => "integer",
                SchemaKind::Number => "numeric",
                SchemaKind::Boolean => "boolean",
                _ => "string",
            }
            .to_string(),
        );

        if let Some(format) = &node.format {
            // Unknown formats degrade silently to no token.
            if let Some(token) = format_token(format) {
                tokens.push(token);
            }
        }

        if let Some(c) = &node.constraints {
            if let Some(min) = c.min_length {
                tokens.push(format!("min:{min}"));
            }
            if let Some(max) = c.max_length {
                tokens.push(format!("max:{max}"));
            }

            // Exclusive bounds win over inclusive ones on the same side.
            if let Some(gt) = c.exclusive_minimum {
                tokens.push(format!("gt:{}", format_number(gt)));
            } else if let Some(min) = c.minimum {
                tokens.push(format!("min:{}", format_number(min)));
            }
            if let Some(lt) = c.exclusive_maximum {
                tokens.push(format!("lt:{}", format_number(lt)));
            } else if let Some(max) = c.maximum {
                tokens.push(format!("max:{}", format_number(max)));
            }

            if let Some(pattern) = &c.pattern {
                if !pattern_is_balanced(pattern) {
                    self.pattern_warnings.push(PatternWarning {
                        field: field_path.to_string(),
                        pattern: pattern.clone(),
                        message: "unbalanced brackets in pattern".to_string(),
                    });
                }
                tokens.push(format!("regex:/{}/", pattern.replace('/', "\\/")));
            }

            // Most rule languages have no native multipleOf; emit a named
            // custom token.
            if let Some(m) = c.multiple_of {
                tokens.push(format!("multiple_of:{}", format_number(m)));
            }

            if let Some(values) = &c.enum_values {
                let joined = values
                    .iter()
                    .map(enum_literal)
                    .collect::<Vec<_>>()
                    .join(",");
                tokens.push(format!("in:{joined}"));
            }
        }

        tokens
    }
}

fn join_path(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{base}.{segment}")
    }
}

/// Remove duplicate tokens, keeping first-occurrence order.
fn dedup(tokens: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

/// Fixed format -> rule token lookup.
fn format_token(format: &str) -> Option<String> {
    let token = match format {
        "email" => "email",
        "uri" | "url" => "url",
        "date" => "date",
        "date-time" => "date",
        "uuid" => "uuid",
        "ipv4" => "ipv4",
        "ipv6" => "ipv6",
        "ip" => "ip",
        "byte" => "regex:/^[A-Za-z0-9+\\/]*={0,2}$/",
        "binary" | "file" => "file",
        _ => return None,
    };
    Some(token.to_string())
}

/// Integral values print without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn enum_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Best-effort sanity check: balanced `()`, `[]`, `{}` outside escapes.
fn pattern_is_balanced(pattern: &str) -> bool {
    let mut depth_paren = 0i32;
    let mut depth_brace = 0i32;
    let mut depth_bracket = 0i32;
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '(' => depth_paren += 1,
            ')' => depth_paren -= 1,
            '{' => depth_brace += 1,
            '}' => depth_brace -= 1,
            '[' => depth_bracket += 1,
            ']' => depth_bracket -= 1,
            _ => {}
        }
        if depth_paren < 0 || depth_brace < 0 || depth_bracket < 0 {
            return false;
        }
    }
    depth_paren == 0 && depth_brace == 0 && depth_bracket == 0
}
