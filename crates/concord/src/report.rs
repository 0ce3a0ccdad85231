//! Text rendering of reconciliation results and rule maps.

use std::fmt::Write as _;

use concord_reconcile::{Mismatch, ValidationResult};

/// Render a reconciliation result as a human-readable report.
pub fn render_result(result: &ValidationResult) -> String {
    let mut out = String::new();

    if result.is_valid {
        out.push_str("OK: documented and implemented surfaces agree\n");
    } else {
        let _ = writeln!(out, "FAIL: {} discrepancies", result.mismatches.len());
    }

    if !result.mismatches.is_empty() {
        out.push_str("\nDiscrepancies:\n");
        for m in &result.mismatches {
            render_mismatch(&mut out, m);
        }
    }
    if !result.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for m in &result.warnings {
            render_mismatch(&mut out, m);
        }
    }

    let s = &result.statistics;
    out.push_str("\nStatistics:\n");
    let _ = writeln!(
        out,
        "  routes:    {}/{} covered ({}%)",
        s.covered_routes, s.total_routes, s.route_coverage
    );
    let _ = writeln!(
        out,
        "  endpoints: {}/{} covered ({}%)",
        s.covered_endpoints, s.total_endpoints, s.endpoint_coverage
    );
    let _ = writeln!(out, "  total coverage: {}%", s.total_coverage);

    out
}

fn render_mismatch(out: &mut String, m: &Mismatch) {
    let _ = writeln!(
        out,
        "  [{}] {} {}: {}",
        severity_tag(m),
        m.method,
        m.path,
        m.message
    );
    for suggestion in &m.suggestions {
        let _ = writeln!(out, "      hint: {suggestion}");
    }
}

fn severity_tag(m: &Mismatch) -> &'static str {
    match m.severity {
        concord_reconcile::Severity::Error => "error",
        concord_reconcile::Severity::Warning => "warn",
        concord_reconcile::Severity::Info => "info",
    }
}

/// Render per-operation rule maps as text.
pub fn render_rules(operations: &[(String, indexmap::IndexMap<String, String>)]) -> String {
    let mut out = String::new();
    for (operation_id, rules) in operations {
        let _ = writeln!(out, "{operation_id}:");
        for (field, rule) in rules {
            let _ = writeln!(out, "  {field}: {rule}");
        }
    }
    out
}
