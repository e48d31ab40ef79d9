pub mod candidates;
pub mod explain;
pub mod matches;
pub mod resolve;
pub mod rewrite;
pub mod version;

use fallback_core::config::OPTIONS_FILE_NAME;
use fallback_core::{FallbackOptions, FallbackResolver};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Failure result for JSON output when no resolver could be built.
#[derive(Serialize)]
struct BuildErrorJsonResult {
    ok: bool,
    error: String,
}

/// Resolver options shared by every resolving command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ResolverArgs {
    /// Fallback directory, highest priority first (repeatable)
    #[arg(long = "dir", short = 'd', value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Suffix tried after the bare path, in order (repeatable, e.g. --ext .js)
    #[arg(long = "ext", short = 'e', value_name = "EXT")]
    pub exts: Vec<String>,

    /// Request prefix token (default: "fallback")
    #[arg(long)]
    pub prefix: Option<String>,

    /// Prefix pattern template; `{prefix}` is replaced by the prefix
    #[arg(long)]
    pub pattern: Option<String>,

    /// Options file (defaults to ./fallback.json when present)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ResolverArgs {
    /// Merge the options file (if any) with command-line flags.
    pub fn options(&self, cwd: &Path) -> Result<FallbackOptions> {
        let file = match &self.config {
            Some(path) => Some(cwd.join(path)),
            None => Some(cwd.join(OPTIONS_FILE_NAME)).filter(|p| p.is_file()),
        };

        let base = match file {
            Some(path) => {
                debug!(path = %path.display(), "Loading resolver options");
                FallbackOptions::from_file(&path).into_diagnostic()?
            }
            None => FallbackOptions::new(),
        };

        let overrides = FallbackOptions {
            directories: (!self.dirs.is_empty()).then(|| self.dirs.clone()),
            extensions: (!self.exts.is_empty()).then(|| self.exts.clone()),
            prefix: self.prefix.clone(),
            pattern: self.pattern.clone(),
            ..FallbackOptions::default()
        };

        let mut options = base.overlay(overrides);
        if options.root.is_none() {
            options.root = Some(cwd.to_path_buf());
        }
        Ok(options)
    }

    /// Build a resolver from the merged options.
    pub fn build(&self, cwd: &Path) -> Result<FallbackResolver> {
        FallbackResolver::new(self.options(cwd)?).into_diagnostic()
    }

    /// Build a resolver; in JSON mode a failure prints `{ok: false, error}`
    /// and exits 1 instead of returning a diagnostic.
    pub fn build_or_exit(&self, cwd: &Path, json: bool) -> Result<FallbackResolver> {
        match self.build(cwd) {
            Ok(resolver) => Ok(resolver),
            Err(e) if json => {
                let result = BuildErrorJsonResult {
                    ok: false,
                    error: e.to_string(),
                };
                println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
                std::process::exit(1);
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("fallback.json"),
            r#"{"directories": ["a"], "extensions": [".js"], "prefix": "theme"}"#,
        )
        .unwrap();

        let args = ResolverArgs {
            exts: vec![".ts".to_string()],
            ..ResolverArgs::default()
        };
        let options = args.options(dir.path()).unwrap();

        assert_eq!(options.directories, Some(vec![PathBuf::from("a")]));
        assert_eq!(options.extensions, Some(vec![".ts".to_string()]));
        assert_eq!(options.prefix.as_deref(), Some("theme"));
        assert_eq!(options.root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_no_file_uses_flags_only() {
        let dir = tempfile::tempdir().unwrap();
        let args = ResolverArgs {
            dirs: vec![PathBuf::from("themes")],
            ..ResolverArgs::default()
        };
        let resolver = args.build(dir.path()).unwrap();

        assert_eq!(resolver.options().directories, vec![dir.path().join("themes")]);
        assert_eq!(resolver.options().prefix, "fallback");
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = ResolverArgs {
            config: Some(PathBuf::from("nope.json")),
            ..ResolverArgs::default()
        };
        assert!(args.options(dir.path()).is_err());
    }
}
