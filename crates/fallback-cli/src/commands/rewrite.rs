//! `fallback rewrite` command implementation.
//!
//! Runs one host request (JSON) through the module hook, for hosts that
//! shell out instead of linking the library.

use super::ResolverArgs;
use fallback_core::{HookAction, HookRegistry, ResolveRequest};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Rewrite result for JSON output.
#[derive(Serialize)]
struct RewriteJsonResult {
    ok: bool,
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request: Option<ResolveRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the rewrite command.
///
/// `input` is a JSON request object, or `-` to read it from stdin. Input
/// that is not an object is taken as the bare request target; an object
/// that does not deserialize is reported as an error.
pub fn run(cwd: &Path, input: &str, args: &ResolverArgs) -> Result<()> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
        buf
    } else {
        input.to_string()
    };

    let request = match parse_request(&raw) {
        Ok(request) => request,
        Err(e) => {
            return finish(&RewriteJsonResult {
                ok: false,
                action: "error",
                request: None,
                message: None,
                error: Some(format!("Invalid request: {e}")),
            });
        }
    };

    let mut registry = HookRegistry::new();
    Arc::new(args.build_or_exit(cwd, true)?).apply(&mut registry);

    let result = match registry.dispatch(&request) {
        Ok(HookAction::Rewrite { request, message }) => RewriteJsonResult {
            ok: true,
            action: "rewrite",
            request: Some(request),
            message: Some(message),
            error: None,
        },
        Ok(HookAction::PassThrough) => RewriteJsonResult {
            ok: true,
            action: "pass_through",
            request: None,
            message: None,
            error: None,
        },
        Err(e) => RewriteJsonResult {
            ok: false,
            action: "error",
            request: None,
            message: None,
            error: Some(e.to_string()),
        },
    };

    finish(&result)
}

fn finish(result: &RewriteJsonResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result).into_diagnostic()?);

    if !result.ok {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_request(raw: &str) -> Result<ResolveRequest, serde_json::Error> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        serde_json::from_str(trimmed)
    } else {
        Ok(ResolveRequest::new(trimmed))
    }
}
