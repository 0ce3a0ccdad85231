//! The reconciliation engine: signature maps, classification, coverage.

use indexmap::IndexMap;
use regex_lite::Regex;
use serde_json::json;
use tracing::debug;

use concord_spec::{EndpointDefinition, HttpMethod};

use crate::result::{Mismatch, MismatchKind, Severity, Statistics, ValidationResult};
use crate::route::Route;
use crate::similarity::{composite, SimilarityConfig};

/// Path fragments of framework-internal tooling routes, never reportable as
/// missing documentation.
const INTERNAL_PATH_FRAGMENTS: &[&str] = &[
    "telescope",
    "horizon",
    "_ignition",
    "_debugbar",
    "nova",
    "sanctum/csrf-cookie",
];

/// Caller-tunable reconciliation behavior.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Only routes matching one of these URI patterns (with `*` wildcards)
    /// are eligible for missing-documentation reporting. Empty = all.
    pub include_patterns: Vec<String>,
    /// Routes carrying any of these middleware are never reported.
    pub exclude_middleware: Vec<String>,
    /// Apply the API-route heuristic (api middleware or `api/` prefix).
    pub api_routes_only: bool,
    /// Attach the full route/endpoint lists to the result when no caller
    /// filter was applied, for downstream full-table display.
    pub keep_full_lists: bool,
    pub similarity: SimilarityConfig,
    /// Maximum suggestions attached per mismatch.
    pub max_suggestions: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_middleware: Vec::new(),
            api_routes_only: true,
            keep_full_lists: true,
            similarity: SimilarityConfig::default(),
            max_suggestions: 3,
        }
    }
}

/// Diffs the implemented route surface against the documented endpoint
/// surface.
#[derive(Debug, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    /// Run the reconciliation. Always returns a full result; discrepancies
    /// are itemized, never fatal.
    pub fn reconcile(
        &self,
        routes: &[Route],
        endpoints: &[EndpointDefinition],
    ) -> ValidationResult {
        // One entry per (route, canonical method): Laravel routes list
        // several methods on one row. Insertion-ordered maps keep the report
        // stable across runs for diffing.
        let mut route_map: IndexMap<String, Vec<(usize, String)>> = IndexMap::new();
        for (idx, route) in routes.iter().enumerate() {
            for method in &route.methods {
                if HttpMethod::parse(method).is_none() {
                    continue;
                }
                let sig = route.normalized_signature(method);
                route_map.entry(sig).or_default().push((idx, method.clone()));
            }
        }

        let mut endpoint_map: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (idx, endpoint) in endpoints.iter().enumerate() {
            endpoint_map
                .entry(endpoint.normalized_signature())
                .or_default()
                .push(idx);
        }

        let mut mismatches = Vec::new();
        let mut warnings = Vec::new();
        let mut stats = Statistics {
            total_routes: route_map.values().map(Vec::len).sum(),
            total_endpoints: endpoints.len(),
            ..Statistics::default()
        };

        for (sig, route_entries) in &route_map {
            match endpoint_map.get(sig) {
                Some(endpoint_indices) => {
                    stats.covered_routes += route_entries.len();

                    let (route_idx, method) = &route_entries[0];
                    let route = &routes[*route_idx];
                    let endpoint = &endpoints[endpoint_indices[0]];
                    let implemented = route.path_parameters().len();
                    let documented = endpoint.documented_path_parameter_count();
                    if implemented != documented {
                        warnings.push(
                            Mismatch::new(
                                MismatchKind::ParameterMismatch,
                                Severity::Warning,
                                format!(
                                    "route declares {implemented} path parameter(s) but the document describes {documented}"
                                ),
                                endpoint.path.clone(),
                                method.clone(),
                            )
                            .with_detail("implemented", json!(implemented))
                            .with_detail("documented", json!(documented)),
                        );
                    }
                }
                None => {
                    for (route_idx, method) in route_entries {
                        let route = &routes[*route_idx];
                        if !self.reportable(route) {
                            continue;
                        }
                        let path = route.normalized_path();

                        // Same path shape documented under other methods is
                        // worth calling out alongside the gap itself.
                        let documented_methods = methods_for_path(endpoints, route, method);
                        if !documented_methods.is_empty() {
                            warnings.push(
                                Mismatch::new(
                                    MismatchKind::MethodMismatch,
                                    Severity::Info,
                                    format!(
                                        "path is documented, but only for: {}",
                                        documented_methods.join(", ")
                                    ),
                                    path.clone(),
                                    method.clone(),
                                )
                                .with_detail("documented_methods", json!(documented_methods)),
                            );
                        }

                        let suggestions = self.suggest_endpoints(route, method, endpoints);
                        mismatches.push(
                            Mismatch::new(
                                MismatchKind::MissingDocumentation,
                                Severity::Error,
                                format!("route {method} {path} is not documented"),
                                path,
                                method.clone(),
                            )
                            .with_suggestions(suggestions),
                        );
                        stats.missing_documentation += 1;
                    }
                }
            }
        }

        for (sig, endpoint_indices) in &endpoint_map {
            if route_map.contains_key(sig) {
                stats.covered_endpoints += endpoint_indices.len();
                continue;
            }
            for idx in endpoint_indices {
                let endpoint = &endpoints[*idx];
                let suggestions = self.suggest_routes(endpoint, routes);
                mismatches.push(
                    Mismatch::new(
                        MismatchKind::MissingImplementation,
                        Severity::Error,
                        format!(
                            "documented endpoint {} {} has no implementing route",
                            endpoint.method, endpoint.path
                        ),
                        endpoint.path.clone(),
                        endpoint.method.as_str(),
                    )
                    .with_suggestions(suggestions),
                );
                stats.missing_implementation += 1;
            }
        }

        stats.recompute();
        debug!(
            total_routes = stats.total_routes,
            total_endpoints = stats.total_endpoints,
            missing_documentation = stats.missing_documentation,
            missing_implementation = stats.missing_implementation,
            "reconciliation finished"
        );

        let unfiltered =
            self.options.include_patterns.is_empty() && self.options.exclude_middleware.is_empty();
        ValidationResult {
            is_valid: mismatches.is_empty(),
            mismatches,
            warnings,
            statistics: stats,
            all_routes: (unfiltered && self.options.keep_full_lists)
                .then(|| routes.to_vec()),
            all_endpoints: (unfiltered && self.options.keep_full_lists)
                .then(|| endpoints.to_vec()),
        }
    }

    /// Whether a route is eligible for missing-documentation reporting.
    fn reportable(&self, route: &Route) -> bool {
        if self.options.api_routes_only && !is_api_route(route) {
            return false;
        }
        if route
            .middleware
            .iter()
            .any(|m| self.options.exclude_middleware.contains(m))
        {
            return false;
        }
        if !self.options.include_patterns.is_empty()
            && !self
                .options
                .include_patterns
                .iter()
                .any(|p| wildcard_match(p, &route.uri))
        {
            return false;
        }
        true
    }

    fn suggest_endpoints(
        &self,
        route: &Route,
        method: &str,
        endpoints: &[EndpointDefinition],
    ) -> Vec<String> {
        let path = route.normalized_path();
        let mut candidates: Vec<(f64, String)> = endpoints
            .iter()
            .map(|e| {
                let score = composite(
                    &self.options.similarity,
                    method,
                    &path,
                    e.method.as_str(),
                    &e.path,
                );
                (score, format!("similar documented endpoint: {} {}", e.method, e.path))
            })
            .filter(|(score, _)| *score >= self.options.similarity.cutoff)
            .collect();
        take_top(&mut candidates, self.options.max_suggestions)
    }

    fn suggest_routes(&self, endpoint: &EndpointDefinition, routes: &[Route]) -> Vec<String> {
        let mut candidates: Vec<(f64, String)> = routes
            .iter()
            .flat_map(|r| {
                let path = r.normalized_path();
                r.methods
                    .iter()
                    .filter(|m| HttpMethod::parse(m).is_some())
                    .map(|m| {
                        let score = composite(
                            &self.options.similarity,
                            endpoint.method.as_str(),
                            &endpoint.path,
                            m,
                            &path,
                        );
                        (score, format!("similar implemented route: {m} {path}"))
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|(score, _)| *score >= self.options.similarity.cutoff)
            .collect();
        take_top(&mut candidates, self.options.max_suggestions)
    }
}

/// Sort descending by score and keep the best `n` suggestion strings.
fn take_top(candidates: &mut Vec<(f64, String)>, n: usize) -> Vec<String> {
    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    candidates
        .drain(..)
        .map(|(_, text)| text)
        .take(n)
        .collect()
}

/// Methods under which an unmatched route's path shape is documented.
fn methods_for_path(
    endpoints: &[EndpointDefinition],
    route: &Route,
    method: &str,
) -> Vec<String> {
    let shape = concord_spec::normalize_path_template(&route.normalized_path());
    endpoints
        .iter()
        .filter(|e| {
            concord_spec::normalize_path_template(&e.path) == shape
                && !e.method.as_str().eq_ignore_ascii_case(method)
        })
        .map(|e| e.method.as_str().to_string())
        .collect()
}

/// The API-route heuristic: framework-internal tool paths are excluded, and
/// the route must either carry an `api` middleware tag or live under `api/`.
fn is_api_route(route: &Route) -> bool {
    let uri = route.uri.trim_start_matches('/');
    if INTERNAL_PATH_FRAGMENTS
        .iter()
        .any(|f| contains_path_segments(uri, f))
    {
        return false;
    }
    route.middleware.iter().any(|m| m.contains("api")) || uri.starts_with("api/") || uri == "api"
}

/// Whether `fragment` appears in `uri` as a run of whole path segments.
///
/// Substring matching would misfire on lookalike segments (`api/novations`
/// is not `nova`).
fn contains_path_segments(uri: &str, fragment: &str) -> bool {
    let padded = format!("/{}/", uri.trim_matches('/'));
    padded.contains(&format!("/{fragment}/"))
}

/// Glob-lite matching: `*` matches any run of characters.
fn wildcard_match(pattern: &str, uri: &str) -> bool {
    let mut escaped = String::with_capacity(pattern.len() + 8);
    escaped.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => escaped.push_str(".*"),
            c if "\\.+?()[]{}|^$".contains(c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped.push('$');
    Regex::new(&escaped)
        .map(|re| re.is_match(uri.trim_start_matches('/')))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_spec::ParameterSpec;

    fn route(uri: &str, methods: &[&str], middleware: &[&str]) -> Route {
        Route {
            uri: uri.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
            name: None,
            action: None,
            middleware: middleware.iter().map(|m| m.to_string()).collect(),
            domain: None,
        }
    }

    fn endpoint(path: &str, method: HttpMethod) -> EndpointDefinition {
        EndpointDefinition::new(path, method, "op").unwrap()
    }

    fn path_param(name: &str) -> ParameterSpec {
        ParameterSpec {
            name: name.to_string(),
            location: "path".to_string(),
            required: true,
            schema: None,
        }
    }

    #[test]
    fn matched_and_unmatched_routes_split_coverage() {
        let routes = vec![
            route("users", &["POST"], &["api"]),
            route("users", &["GET"], &["api"]),
        ];
        let endpoints = vec![endpoint("/users", HttpMethod::Post)];

        let result = Reconciler::default().reconcile(&routes, &endpoints);
        assert_eq!(result.statistics.covered_routes, 1);
        assert_eq!(result.statistics.missing_documentation, 1);
        assert_eq!(result.statistics.missing_implementation, 0);
        assert!(!result.is_valid);
        let missing = &result.mismatches[0];
        assert_eq!(missing.kind, MismatchKind::MissingDocumentation);
        assert_eq!(missing.method, "GET");
    }

    #[test]
    fn parameter_names_never_affect_matching() {
        let routes = vec![route("api/users/{user}", &["GET"], &["api"])];
        let mut e = endpoint("/api/users/{userId}", HttpMethod::Get);
        e.parameters = vec![path_param("userId")];

        let result = Reconciler::default().reconcile(&routes, &[e]);
        assert!(result.is_valid);
        assert_eq!(result.statistics.covered_routes, 1);
        assert_eq!(result.statistics.covered_endpoints, 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn undocumented_path_parameter_is_a_warning_not_an_error() {
        let routes = vec![route("api/users/{user}", &["GET"], &["api"])];
        // Same path template, but the parameters list is empty.
        let e = endpoint("/api/users/{user}", HttpMethod::Get);

        let result = Reconciler::default().reconcile(&routes, &[e]);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, MismatchKind::ParameterMismatch);
    }

    #[test]
    fn missing_implementation_per_unmatched_endpoint() {
        let endpoints = vec![
            endpoint("/api/orders", HttpMethod::Get),
            endpoint("/api/orders", HttpMethod::Post),
        ];
        let result = Reconciler::default().reconcile(&[], &endpoints);
        assert_eq!(result.statistics.missing_implementation, 2);
        assert!(result
            .mismatches
            .iter()
            .all(|m| m.kind == MismatchKind::MissingImplementation));
        // Vacuous route coverage.
        assert_eq!(result.statistics.route_coverage, 100.0);
    }

    #[test]
    fn zero_routes_zero_endpoints_is_full_coverage() {
        let result = Reconciler::default().reconcile(&[], &[]);
        assert!(result.is_valid);
        assert_eq!(result.statistics.total_coverage, 100.0);
    }

    #[test]
    fn n_routes_zero_endpoints_boundary() {
        let routes = vec![
            route("api/a", &["GET"], &["api"]),
            route("api/b", &["GET"], &["api"]),
            route("api/c", &["GET"], &["api"]),
        ];
        let result = Reconciler::default().reconcile(&routes, &[]);
        assert_eq!(result.statistics.missing_documentation, 3);
        assert_eq!(result.statistics.endpoint_coverage, 100.0);
        assert_eq!(result.statistics.route_coverage, 0.0);
    }

    #[test]
    fn framework_internal_routes_are_not_reported() {
        let routes = vec![
            route("telescope/requests", &["GET"], &["web"]),
            route("_ignition/health-check", &["GET"], &[]),
            route("web/dashboard", &["GET"], &["web"]),
        ];
        let result = Reconciler::default().reconcile(&routes, &[]);
        // None pass the API-route heuristic.
        assert_eq!(result.statistics.missing_documentation, 0);
        assert!(result.is_valid);
    }

    #[test]
    fn fragment_lookalike_segments_are_still_reported() {
        let routes = vec![
            route("api/novations", &["GET"], &["api"]),
            route("api/horizons/{id}", &["GET"], &["api"]),
            route("api/nova/dashboard", &["GET"], &["api"]),
        ];
        let result = Reconciler::default().reconcile(&routes, &[]);
        // Whole-segment matching: `novations` and `horizons` are real API
        // paths; `nova` as its own segment is the excluded tool.
        assert_eq!(result.statistics.missing_documentation, 2);
        assert!(result
            .mismatches
            .iter()
            .all(|m| !m.path.contains("/nova/")));
    }

    #[test]
    fn report_order_follows_input_order() {
        let routes = vec![
            route("api/zebra", &["GET"], &["api"]),
            route("api/alpha", &["GET"], &["api"]),
            route("api/mike", &["GET"], &["api"]),
        ];
        let endpoints = vec![
            endpoint("/api/tango", HttpMethod::Get),
            endpoint("/api/bravo", HttpMethod::Get),
        ];
        let result = Reconciler::default().reconcile(&routes, &endpoints);
        let paths: Vec<&str> = result.mismatches.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/api/zebra",
                "/api/alpha",
                "/api/mike",
                "/api/tango",
                "/api/bravo"
            ]
        );
    }

    #[test]
    fn api_prefix_counts_without_api_middleware() {
        let routes = vec![route("api/things", &["GET"], &["web"])];
        let result = Reconciler::default().reconcile(&routes, &[]);
        assert_eq!(result.statistics.missing_documentation, 1);
    }

    #[test]
    fn exclude_middleware_filter_suppresses_reporting() {
        let options = ReconcileOptions {
            exclude_middleware: vec!["internal".to_string()],
            ..ReconcileOptions::default()
        };
        let routes = vec![route("api/secret", &["GET"], &["api", "internal"])];
        let result = Reconciler::new(options).reconcile(&routes, &[]);
        assert_eq!(result.statistics.missing_documentation, 0);
        // A filter was applied, so the full lists are omitted.
        assert!(result.all_routes.is_none());
    }

    #[test]
    fn include_pattern_filter() {
        let options = ReconcileOptions {
            include_patterns: vec!["api/v2/*".to_string()],
            ..ReconcileOptions::default()
        };
        let routes = vec![
            route("api/v1/old", &["GET"], &["api"]),
            route("api/v2/new", &["GET"], &["api"]),
        ];
        let result = Reconciler::new(options).reconcile(&routes, &[]);
        assert_eq!(result.statistics.missing_documentation, 1);
        assert_eq!(result.mismatches[0].path, "/api/v2/new");
    }

    #[test]
    fn full_lists_attached_when_unfiltered() {
        let routes = vec![route("api/users", &["GET"], &["api"])];
        let endpoints = vec![endpoint("/api/users", HttpMethod::Get)];
        let result = Reconciler::default().reconcile(&routes, &endpoints);
        assert_eq!(result.all_routes.as_ref().map(Vec::len), Some(1));
        assert_eq!(result.all_endpoints.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn method_gap_on_documented_path_is_flagged() {
        let routes = vec![route("api/users", &["DELETE"], &["api"])];
        let endpoints = vec![endpoint("/api/users", HttpMethod::Get)];
        let result = Reconciler::default().reconcile(&routes, &endpoints);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.kind == MismatchKind::MethodMismatch));
        // The gap itself is still reported.
        assert_eq!(result.statistics.missing_documentation, 1);
    }

    #[test]
    fn suggestions_rank_similar_endpoints() {
        let routes = vec![route("api/users/{user}", &["POST"], &["api"])];
        let endpoints = vec![
            endpoint("/api/users/{id}", HttpMethod::Get),
            endpoint("/api/completely/different/thing", HttpMethod::Put),
        ];
        let result = Reconciler::default().reconcile(&routes, &endpoints);
        let missing = &result.mismatches[0];
        assert!(!missing.suggestions.is_empty());
        assert!(missing.suggestions[0].contains("/api/users/{id}"));
        assert!(!missing
            .suggestions
            .iter()
            .any(|s| s.contains("completely")));
    }

    #[test]
    fn non_canonical_methods_are_ignored() {
        let routes = vec![route("api/users", &["GET", "CONNECT"], &["api"])];
        let endpoints = vec![endpoint("/api/users", HttpMethod::Get)];
        let result = Reconciler::default().reconcile(&routes, &endpoints);
        assert_eq!(result.statistics.total_routes, 1);
        assert!(result.is_valid);
    }
}
