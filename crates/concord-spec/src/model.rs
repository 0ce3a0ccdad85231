use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use concord_schema::SchemaNode;

use crate::error::SpecError;

/// The canonical HTTP verbs recognized in `paths` objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// Parse a method name, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "patch" => Some(Self::Patch),
            "delete" => Some(Self::Delete),
            "head" => Some(Self::Head),
            "options" => Some(Self::Options),
            _ => None,
        }
    }

    /// Uppercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Lowercase key as it appears in a path item object.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The document's `info` block.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A parsed OpenAPI document: a thin wrapper over the raw value with typed
/// accessors. Resolution and extraction read through it on demand.
#[derive(Debug, Clone)]
pub struct Document {
    raw: Value,
}

impl Document {
    pub fn new(raw: Value) -> Result<Self, SpecError> {
        if !raw.is_object() {
            return Err(SpecError::NotAnObject);
        }
        Ok(Self { raw })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The root `openapi` version string, if present.
    pub fn openapi_version(&self) -> Option<&str> {
        self.raw.get("openapi").and_then(Value::as_str)
    }

    pub fn info(&self) -> Option<Info> {
        let info = self.raw.get("info")?.as_object()?;
        Some(Info {
            title: info
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            version: info
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            description: info
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    pub fn paths(&self) -> Option<&serde_json::Map<String, Value>> {
        self.raw.get("paths").and_then(Value::as_object)
    }

    pub fn component_schemas(&self) -> Option<&serde_json::Map<String, Value>> {
        self.raw
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Value::as_object)
    }

    /// All `servers[].url` values.
    pub fn server_urls(&self) -> Vec<&str> {
        self.raw
            .get("servers")
            .and_then(Value::as_array)
            .map(|servers| {
                servers
                    .iter()
                    .filter_map(|s| s.get("url").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A raw operation parameter (already `$ref`-resolved by the extractor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    /// `path`, `query`, `header`, or `cookie`.
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// One documented endpoint: a (path, method) pair with its request schema.
///
/// Built once during extraction, immutable thereafter.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointDefinition {
    pub path: String,
    pub method: HttpMethod,
    pub operation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<SchemaNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterSpec>,
}

impl EndpointDefinition {
    /// Construct with the hard invariants checked: these indicate a
    /// caller-side integration bug, not a data-quality issue.
    pub fn new(path: &str, method: HttpMethod, operation_id: &str) -> Result<Self, SpecError> {
        if path.is_empty() || !path.starts_with('/') {
            return Err(SpecError::InvalidPath(path.to_string()));
        }
        if operation_id.is_empty() {
            return Err(SpecError::EmptyOperationId);
        }
        Ok(Self {
            path: path.to_string(),
            method,
            operation_id: operation_id.to_string(),
            request_schema: None,
            summary: None,
            description: None,
            tags: Vec::new(),
            parameters: Vec::new(),
        })
    }

    /// Method + path with parameter names erased; the matching key.
    ///
    /// `GET /users/{userId}` and `GET /users/{id}` share the signature
    /// `GET /users/{param1}` — parameter names never affect matching, only
    /// position and count.
    pub fn normalized_signature(&self) -> String {
        format!(
            "{} {}",
            self.method,
            normalize_path_template(&self.path)
        )
    }

    /// Count of documented `in: path` parameters.
    pub fn documented_path_parameter_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| p.location == "path")
            .count()
    }

    /// A copy of this endpoint with a server base path prepended.
    pub fn with_path_prefix(&self, prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return self.clone();
        }
        let mut out = self.clone();
        out.path = format!("{prefix}{}", self.path);
        out
    }
}

/// Replace every `{param}` segment with a positional `{paramN}` placeholder.
pub fn normalize_path_template(path: &str) -> String {
    let mut counter = 0usize;
    let segments: Vec<String> = path
        .split('/')
        .map(|seg| {
            if seg.starts_with('{') && seg.ends_with('}') && seg.len() > 2 {
                counter += 1;
                format!("{{param{counter}}}")
            } else {
                seg.to_string()
            }
        })
        .collect();
    segments.join("/")
}

/// Resolve the server base path.
///
/// More than one distinct prefix requires an explicit caller choice; a sole
/// prefix is the default; no servers means no prefix.
pub fn base_path(doc: &Document, explicit: Option<&str>) -> Result<String, SpecError> {
    if let Some(path) = explicit {
        return Ok(path.trim_end_matches('/').to_string());
    }

    let mut prefixes: Vec<String> = Vec::new();
    for url in doc.server_urls() {
        let prefix = url_path_prefix(url);
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }

    match prefixes.len() {
        0 => Ok(String::new()),
        1 => Ok(prefixes.remove(0)),
        _ => Err(SpecError::AmbiguousBasePath(prefixes.join(", "))),
    }
}

/// The path portion of a server URL, without trailing slash.
fn url_path_prefix(url: &str) -> String {
    let path = if let Some(rest) = url.split_once("://").map(|(_, r)| r) {
        match rest.find('/') {
            Some(idx) => &rest[idx..],
            None => "",
        }
    } else {
        url
    };
    path.trim_end_matches('/').to_string()
}
