//! `fallback match` command implementation.

use super::ResolverArgs;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;

/// Match result for JSON output.
#[derive(Serialize)]
struct MatchJsonResult {
    ok: bool,
    request: String,
    matches: bool,
    pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stripped: Option<String>,
}

/// Run the match command.
pub fn run(cwd: &Path, request: &str, args: &ResolverArgs, json: bool) -> Result<()> {
    let resolver = args.build_or_exit(cwd, json)?;
    let stripped = resolver.strip_prefix(request);

    if json {
        let result = MatchJsonResult {
            ok: true,
            request: request.to_string(),
            matches: stripped.is_some(),
            pattern: resolver.pattern().to_string(),
            stripped,
        };
        println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
    } else if let Some(stripped) = stripped {
        println!("match: {request} (stripped: {stripped})");
    } else {
        println!("no match: {request} (pattern: {})", resolver.pattern());
    }

    Ok(())
}
