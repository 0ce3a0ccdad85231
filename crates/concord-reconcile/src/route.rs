//! The external route model.
//!
//! Consumed as data: the host framework's route table is enumerated
//! elsewhere (`php artisan route:list --json` or equivalent) and handed to
//! the engine as a list. Both the `methods` array shape and the pipe-joined
//! `method` string shape are accepted.

use regex_lite::Regex;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use concord_spec::normalize_path_template;

use crate::error::RouteError;

/// Matches `{name}` and `{name?}` path parameter segments.
fn param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^/{}?]+)\??\}").expect("valid literal regex"))
}

/// One implemented route, as collected from the host framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub uri: String,
    #[serde(alias = "method", deserialize_with = "deserialize_methods")]
    pub methods: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "actionIdentifier")]
    pub action: Option<String>,
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

impl Route {
    /// Parameter names extracted from the URI, optional markers stripped.
    pub fn path_parameters(&self) -> Vec<String> {
        param_regex()
            .captures_iter(&self.uri)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// URI with a leading slash and optional markers stripped.
    pub fn normalized_path(&self) -> String {
        let uri = self.uri.trim_start_matches('/');
        let path = format!("/{uri}");
        path.replace("?}", "}")
    }

    /// The same style of normalized signature an endpoint derives.
    pub fn normalized_signature(&self, method: &str) -> String {
        format!(
            "{} {}",
            method.to_ascii_uppercase(),
            normalize_path_template(&self.normalized_path())
        )
    }

    /// Whether any middleware entry matches `tag` exactly.
    pub fn has_middleware(&self, tag: &str) -> bool {
        self.middleware.iter().any(|m| m == tag)
    }
}

/// Accepts `["GET", "HEAD"]` or `"GET|HEAD"`.
fn deserialize_methods<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s
            .split('|')
            .map(|m| m.trim().to_ascii_uppercase())
            .filter(|m| !m.is_empty())
            .collect()),
        Value::Array(entries) => Ok(entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_ascii_uppercase)
            .collect()),
        _ => Err(serde::de::Error::custom(
            "methods must be an array or a pipe-joined string",
        )),
    }
}

/// Parse a route list from JSON text.
pub fn load_routes(input: &str) -> Result<Vec<Route>, RouteError> {
    let value: Value =
        serde_json::from_str(input).map_err(|e| RouteError::ParseError(e.to_string()))?;
    let entries = value.as_array().ok_or(RouteError::NotAnArray)?;
    entries
        .iter()
        .map(|entry| {
            serde_json::from_value(entry.clone())
                .map_err(|e| RouteError::ParseError(e.to_string()))
        })
        .collect()
}

/// Read and parse a route list file.
pub fn load_routes_file(path: &std::path::Path) -> Result<Vec<Route>, RouteError> {
    let content = std::fs::read_to_string(path)?;
    load_routes(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn route(uri: &str) -> Route {
        Route {
            uri: uri.to_string(),
            methods: vec!["GET".to_string()],
            name: None,
            action: None,
            middleware: Vec::new(),
            domain: None,
        }
    }

    #[test]
    fn extracts_path_parameters_and_strips_optional_marker() {
        let r = route("api/users/{user}/posts/{post?}");
        assert_eq!(r.path_parameters(), vec!["user", "post"]);
        assert_eq!(r.normalized_path(), "/api/users/{user}/posts/{post}");
    }

    #[test]
    fn signature_matches_endpoint_style() {
        let r = route("api/users/{user}");
        assert_eq!(
            r.normalized_signature("get"),
            "GET /api/users/{param1}"
        );
    }

    #[test]
    fn accepts_pipe_joined_method_string() {
        let routes = load_routes(
            r#"[{"uri": "api/users", "method": "GET|HEAD", "middleware": ["api"]}]"#,
        )
        .unwrap();
        assert_eq!(routes[0].methods, vec!["GET", "HEAD"]);
    }

    #[test]
    fn accepts_methods_array() {
        let routes = load_routes(
            r#"[{"uri": "api/users", "methods": ["get", "post"], "name": "users.index"}]"#,
        )
        .unwrap();
        assert_eq!(routes[0].methods, vec!["GET", "POST"]);
        assert_eq!(routes[0].name.as_deref(), Some("users.index"));
    }

    #[test]
    fn non_array_route_list_is_rejected() {
        assert!(matches!(
            load_routes(r#"{"uri": "api/users"}"#),
            Err(RouteError::NotAnArray)
        ));
    }

    #[test]
    fn routes_round_trip_through_serde() {
        let r = route("api/items/{id}");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["uri"], json!("api/items/{id}"));
    }
}
