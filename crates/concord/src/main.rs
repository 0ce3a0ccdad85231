//! Concord: OpenAPI conformance toolkit.
//!
//! Compiles request schemas into validation rule maps and reconciles the
//! documented API surface against an externally collected route table.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use concord_reconcile::{
    load_routes, Mismatch, MismatchKind, ReconcileOptions, Reconciler, Severity, ValidationResult,
};
use concord_rules::RuleCompiler;
use concord_spec::{base_path, check_document, extract, load_document_file, Document};

mod report;

#[derive(Parser, Debug)]
#[command(name = "concord", about = "OpenAPI conformance toolkit", version)]
struct Cli {
    /// Log level (overridden by RUST_LOG).
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile request schemas into validation rule maps.
    Rules {
        /// Input OpenAPI document (YAML or JSON).
        #[arg(short, long)]
        spec: PathBuf,

        /// Server base path when the document declares several.
        #[arg(long)]
        base_path: Option<String>,

        /// Output format (text or json).
        #[arg(long, default_value = "text")]
        format: String,

        /// Write output to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reconcile documented endpoints against an implemented route list.
    Reconcile {
        /// Input OpenAPI document (YAML or JSON).
        #[arg(short, long)]
        spec: PathBuf,

        /// Route list JSON (e.g. `php artisan route:list --json`).
        #[arg(short, long)]
        routes: PathBuf,

        /// Only report routes matching these URI patterns (`*` wildcards).
        #[arg(long = "include")]
        include_patterns: Vec<String>,

        /// Never report routes carrying these middleware.
        #[arg(long = "exclude-middleware")]
        exclude_middleware: Vec<String>,

        /// Report all routes, not only API ones.
        #[arg(long)]
        all_routes: bool,

        /// Server base path when the document declares several.
        #[arg(long)]
        base_path: Option<String>,

        /// Output format (text or json).
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check document quality without reconciling.
    Validate {
        /// Input OpenAPI document (YAML or JSON).
        #[arg(short, long)]
        spec: PathBuf,

        /// Output format (text or json).
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let outcome = match cli.command {
        Commands::Rules {
            spec,
            base_path,
            format,
            output,
        } => run_rules(&spec, base_path.as_deref(), &format, output.as_deref()),
        Commands::Reconcile {
            spec,
            routes,
            include_patterns,
            exclude_middleware,
            all_routes,
            base_path,
            format,
        } => run_reconcile(
            &spec,
            &routes,
            include_patterns,
            exclude_middleware,
            all_routes,
            base_path.as_deref(),
            &format,
        ),
        Commands::Validate { spec, format } => run_validate(&spec, &format),
    };

    match outcome {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// `rules` subcommand. Returns whether the run was clean.
fn run_rules(
    spec: &Path,
    explicit_base: Option<&str>,
    format: &str,
    output: Option<&Path>,
) -> anyhow::Result<bool> {
    let doc = load_document_file(spec)
        .with_context(|| format!("failed to load {}", spec.display()))?;
    let report = check_document(&doc);
    for error in &report.errors {
        eprintln!("error: {error}");
    }
    if !report.is_ok() {
        return Ok(false);
    }

    let endpoints = extracted_endpoints(&doc, explicit_base)?;
    let mut compiler = RuleCompiler::new();
    let mut operations = Vec::new();
    for endpoint in &endpoints {
        if let Some(schema) = &endpoint.request_schema {
            operations.push((endpoint.operation_id.clone(), compiler.compile(schema, "")));
        }
    }
    for warning in compiler.pattern_warnings() {
        eprintln!(
            "warning: field '{}': {} (pattern: {})",
            warning.field, warning.message, warning.pattern
        );
    }

    let rendered = match format {
        "json" => {
            let mut map = serde_json::Map::new();
            for (operation_id, rules) in &operations {
                map.insert(operation_id.clone(), serde_json::to_value(rules)?);
            }
            serde_json::to_string_pretty(&serde_json::Value::Object(map))?
        }
        _ => report::render_rules(&operations),
    };
    emit(&rendered, output)?;
    Ok(true)
}

/// `reconcile` subcommand.
fn run_reconcile(
    spec: &Path,
    routes_path: &Path,
    include_patterns: Vec<String>,
    exclude_middleware: Vec<String>,
    all_routes: bool,
    explicit_base: Option<&str>,
    format: &str,
) -> anyhow::Result<bool> {
    let doc = load_document_file(spec)
        .with_context(|| format!("failed to load {}", spec.display()))?;
    let quality = document_quality_result(&doc);

    let endpoints = extracted_endpoints(&doc, explicit_base)?;
    let routes_json = std::fs::read_to_string(routes_path)
        .with_context(|| format!("failed to read {}", routes_path.display()))?;
    let routes = load_routes(&routes_json)?;

    let reconciler = Reconciler::new(ReconcileOptions {
        include_patterns,
        exclude_middleware,
        api_routes_only: !all_routes,
        ..ReconcileOptions::default()
    });
    let result = quality.merge(reconciler.reconcile(&routes, &endpoints));

    let rendered = match format {
        "json" => serde_json::to_string_pretty(&result)?,
        _ => report::render_result(&result),
    };
    println!("{rendered}");
    Ok(result.is_valid)
}

/// `validate` subcommand.
fn run_validate(spec: &Path, format: &str) -> anyhow::Result<bool> {
    let doc = load_document_file(spec)
        .with_context(|| format!("failed to load {}", spec.display()))?;
    let report = check_document(&doc);
    let outcome = extract(&doc);

    let errors: Vec<&String> = report.errors.iter().chain(&outcome.errors).collect();
    let warnings: Vec<&String> = report.warnings.iter().chain(&outcome.warnings).collect();

    match format {
        "json" => {
            let value = serde_json::json!({
                "is_valid": errors.is_empty(),
                "errors": errors,
                "warnings": warnings,
                "endpoints": outcome.endpoints.len(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        _ => {
            for error in &errors {
                println!("error: {error}");
            }
            for warning in &warnings {
                println!("warning: {warning}");
            }
            if errors.is_empty() {
                println!("OK: {} endpoint(s)", outcome.endpoints.len());
            }
        }
    }
    Ok(errors.is_empty())
}

/// Extract endpoints and apply the resolved server base path.
fn extracted_endpoints(
    doc: &Document,
    explicit_base: Option<&str>,
) -> anyhow::Result<Vec<concord_spec::EndpointDefinition>> {
    let prefix = base_path(doc, explicit_base)?;
    let outcome = extract(doc);
    for error in &outcome.errors {
        eprintln!("error: {error}");
    }
    for warning in &outcome.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(outcome
        .endpoints
        .iter()
        .map(|e| e.with_path_prefix(&prefix))
        .collect())
}

/// Document-quality findings folded into the result shape so they merge with
/// the reconciliation pass.
fn document_quality_result(doc: &Document) -> ValidationResult {
    let report = check_document(doc);
    let mut result = ValidationResult::empty();
    result.is_valid = report.is_ok();
    for error in report.errors {
        result.mismatches.push(Mismatch::new(
            MismatchKind::ValidationError,
            Severity::Error,
            error,
            "",
            "",
        ));
    }
    for warning in report.warnings {
        result.warnings.push(Mismatch::new(
            MismatchKind::ValidationError,
            Severity::Info,
            warning,
            "",
            "",
        ));
    }
    result
}

/// Write to the output file (creating parent directories) or stdout.
fn emit(rendered: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
