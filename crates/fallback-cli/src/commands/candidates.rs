//! `fallback candidates` command implementation.

use super::ResolverArgs;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;

/// Candidates result for JSON output.
#[derive(Serialize)]
struct CandidatesJsonResult {
    ok: bool,
    path: String,
    candidates: Vec<String>,
}

/// Run the candidates command.
///
/// `path` may be a stripped path or a full prefixed request.
pub fn run(cwd: &Path, path: &str, args: &ResolverArgs, json: bool) -> Result<()> {
    let resolver = args.build_or_exit(cwd, json)?;
    let stripped = resolver
        .strip_prefix(path)
        .unwrap_or_else(|| path.to_string());

    let candidates: Vec<String> = resolver
        .candidates(&stripped)
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();

    if json {
        let result = CandidatesJsonResult {
            ok: true,
            path: stripped,
            candidates,
        };
        println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
    } else if candidates.is_empty() {
        println!("no candidates (no fallback directories configured)");
    } else {
        for (i, candidate) in candidates.iter().enumerate() {
            println!("{:>3}. {candidate}", i + 1);
        }
    }

    Ok(())
}
