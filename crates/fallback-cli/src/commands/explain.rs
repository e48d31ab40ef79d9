//! `fallback explain` command implementation.

use super::ResolverArgs;
use fallback_core::resolver::{ResolveTrace, EXPLAIN_SCHEMA_VERSION};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;

/// Explain result for JSON output.
#[derive(Serialize)]
struct ExplainJsonResult {
    ok: bool,
    schema_version: u32,
    request: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<String>,
    pattern: String,
    directories: Vec<String>,
    extensions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<ResolveTrace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the explain command.
pub fn run(cwd: &Path, request: &str, args: &ResolverArgs, json: bool) -> Result<()> {
    let resolver = args.build_or_exit(cwd, json)?;
    let options = resolver.options();

    let mut result = ExplainJsonResult {
        ok: true,
        schema_version: EXPLAIN_SCHEMA_VERSION,
        request: request.to_string(),
        status: None,
        resolved: None,
        pattern: resolver.pattern().to_string(),
        directories: options
            .directories
            .iter()
            .map(|d| d.to_string_lossy().into_owned())
            .collect(),
        extensions: options.extensions.clone(),
        trace: None,
        error: None,
    };

    let (resolution, trace) = resolver.resolve_with_trace(request);
    match resolution {
        Ok(resolution) => {
            result.status = Some(resolution.as_str());
            result.resolved = resolution.path().map(|p| p.to_string_lossy().into_owned());
        }
        Err(e) => {
            result.ok = false;
            result.error = Some(e.to_string());
        }
    }
    result.trace = Some(trace);

    if json {
        println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
    } else {
        print_explain_human(&result);
    }

    if !result.ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Print the explain result in human-readable format.
fn print_explain_human(result: &ExplainJsonResult) {
    println!("Request: {}", result.request);
    println!("Pattern: {}", result.pattern);
    if result.directories.is_empty() {
        println!("Directories: (none)");
    } else {
        println!("Directories:");
        for dir in &result.directories {
            println!("  - {dir}");
        }
    }
    if !result.extensions.is_empty() {
        println!("Extensions: {}", result.extensions.join(", "));
    }
    println!();

    if let Some(ref resolved) = result.resolved {
        println!("Resolved: {resolved}");
    } else if let Some(status) = result.status {
        println!("Status: {}", status.to_uppercase());
    }
    if let Some(ref error) = result.error {
        println!("Error: {error}");
    }

    let Some(ref trace) = result.trace else {
        return;
    };

    println!();
    println!("Resolution trace:");
    for (i, step) in trace.steps.iter().enumerate() {
        let status = if step.ok { "OK" } else { "FAIL" };
        println!("  {}. [{}] {}: {}", i + 1, status, step.step, step.detail);

        if let Some(ref path) = step.path {
            println!("      path: {}", path.display());
        }
        for note in &step.notes {
            println!("      note: {note}");
        }
    }

    if !trace.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &trace.warnings {
            println!("  [{}] {}", warning.code, warning.message);
        }
    }
}
