//! Reconciliation output: mismatches, statistics, and the merged result.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use concord_spec::EndpointDefinition;

use crate::route::Route;

/// Discrepancy classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    MissingDocumentation,
    MissingImplementation,
    MethodMismatch,
    ParameterMismatch,
    ValidationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One reported discrepancy. Created only by the engine; immutable value.
#[derive(Debug, Clone, Serialize)]
pub struct Mismatch {
    #[serde(rename = "type")]
    pub kind: MismatchKind,
    pub message: String,
    pub path: String,
    pub method: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    pub severity: Severity,
}

impl Mismatch {
    pub fn new(
        kind: MismatchKind,
        severity: Severity,
        message: impl Into<String>,
        path: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            path: path.into(),
            method: method.into(),
            details: BTreeMap::new(),
            suggestions: Vec::new(),
            severity,
        }
    }

    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

/// Coverage statistics, percentages rounded to 2 decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total_routes: usize,
    pub total_endpoints: usize,
    pub covered_routes: usize,
    pub covered_endpoints: usize,
    pub missing_documentation: usize,
    pub missing_implementation: usize,
    pub route_coverage: f64,
    pub endpoint_coverage: f64,
    pub total_coverage: f64,
}

impl Statistics {
    /// Recompute the coverage percentages from the counts.
    ///
    /// A vacuous denominator is full coverage: with nothing to cover,
    /// nothing is uncovered.
    pub fn recompute(&mut self) {
        self.route_coverage = ratio(self.covered_routes, self.total_routes);
        self.endpoint_coverage = ratio(self.covered_endpoints, self.total_endpoints);

        let both = self.total_routes + self.total_endpoints;
        self.total_coverage = if both == 0 {
            100.0
        } else {
            // True bidirectional coverage needs a match on both sides.
            let matched_both = self.covered_routes.min(self.covered_endpoints) * 2;
            round2(matched_both as f64 / both as f64 * 100.0)
        };
    }

    /// Sum counts with another statistics block and recompute ratios.
    pub fn merge(&mut self, other: &Statistics) {
        self.total_routes += other.total_routes;
        self.total_endpoints += other.total_endpoints;
        self.covered_routes += other.covered_routes;
        self.covered_endpoints += other.covered_endpoints;
        self.missing_documentation += other.missing_documentation;
        self.missing_implementation += other.missing_implementation;
        self.recompute();
    }
}

fn ratio(covered: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        round2(covered as f64 / total as f64 * 100.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregate reconciliation outcome.
///
/// Never all-or-nothing: partial results always come back with an explicit
/// validity flag and itemized issues.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub mismatches: Vec<Mismatch>,
    pub warnings: Vec<Mismatch>,
    pub statistics: Statistics,
    /// Full route list, present only when no caller filter was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_routes: Option<Vec<Route>>,
    /// Full endpoint list, present only when no caller filter was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_endpoints: Option<Vec<EndpointDefinition>>,
}

impl ValidationResult {
    pub fn empty() -> Self {
        let mut statistics = Statistics::default();
        statistics.recompute();
        Self {
            is_valid: true,
            mismatches: Vec::new(),
            warnings: Vec::new(),
            statistics,
            all_routes: None,
            all_endpoints: None,
        }
    }

    /// Associative merge: union of findings, statistics summed, validity
    /// ANDed. Used when validation is split across multiple passes.
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.is_valid = self.is_valid && other.is_valid;
        self.mismatches.extend(other.mismatches);
        self.warnings.extend(other.warnings);
        self.statistics.merge(&other.statistics);
        if self.all_routes.is_none() {
            self.all_routes = other.all_routes;
        }
        if self.all_endpoints.is_none() {
            self.all_endpoints = other.all_endpoints;
        }
        self
    }
}
