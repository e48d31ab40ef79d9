//! `fallback resolve` command implementation.

use super::ResolverArgs;
use fallback_core::Resolution;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Resolve result for JSON output.
#[derive(Serialize)]
struct ResolveJsonResult {
    ok: bool,
    results: Vec<ResolveEntry>,
}

/// One request's outcome.
#[derive(Serialize)]
struct ResolveEntry {
    request: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the resolve command.
///
/// Requests are resolved concurrently; repeated requests share one probe run.
pub fn run(cwd: &Path, requests: &[String], args: &ResolverArgs, json: bool) -> Result<()> {
    let resolver = Arc::new(args.build_or_exit(cwd, json)?);

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let outcomes = runtime.block_on(async {
        let handles: Vec<_> = requests
            .iter()
            .map(|request| {
                let resolver = Arc::clone(&resolver);
                let request = request.clone();
                tokio::spawn(async move { resolver.resolve_async(request).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.await);
        }
        outcomes
    });

    let entries: Vec<ResolveEntry> = requests
        .iter()
        .zip(outcomes)
        .map(|(request, outcome)| {
            let outcome = outcome
                .map_err(|e| e.to_string())
                .and_then(|r| r.map_err(|e| e.to_string()));
            match outcome {
                Ok(resolution) => ResolveEntry {
                    request: request.clone(),
                    status: resolution.as_str(),
                    resolved: resolution.path().map(|p| p.to_string_lossy().into_owned()),
                    error: None,
                },
                Err(error) => ResolveEntry {
                    request: request.clone(),
                    status: "error",
                    resolved: None,
                    error: Some(error),
                },
            }
        })
        .collect();

    let ok = entries.iter().all(|e| e.error.is_none());

    if json {
        let result = ResolveJsonResult {
            ok,
            results: entries,
        };
        println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
    } else {
        for entry in &entries {
            print_entry_human(entry);
        }
    }

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn print_entry_human(entry: &ResolveEntry) {
    match (&entry.resolved, &entry.error) {
        (Some(path), _) => println!("{} -> {path}", entry.request),
        (None, Some(error)) => eprintln!("error: {}: {error}", entry.request),
        (None, None) => {
            let label = if entry.status == Resolution::NotApplicable.as_str() {
                "not applicable (no fallback prefix)"
            } else {
                "not found"
            };
            println!("{}: {label}", entry.request);
        }
    }
}
