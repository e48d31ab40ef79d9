//! Fallback directory resolver.
//!
//! Resolves `#<prefix>#/<path>` requests by searching an ordered list of
//! base directories, optionally with extension suffixes:
//! - The first existing candidate wins (directory order, then bare path,
//!   then extensions in order)
//! - Probing is sequential and stops at the first hit
//! - Results, including "not found", are cached per stripped path for the
//!   lifetime of the resolver
//! - Probe I/O failures are returned and not cached

use super::cache::{CacheState, ResolutionCache};
use super::combine::combine;
use super::options::{FallbackOptions, ResolverOptions};
use super::probe::{ExistenceProbe, FsProbe};
use super::trace::{steps, warning_codes, ResolveTrace, ResolveTraceStep, TraceWarning};
use crate::error::Error;
use regex_lite::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The request does not carry the fallback prefix.
    NotApplicable,
    /// The request matched but no candidate exists.
    NotFound,
    /// Absolute path of the first existing candidate.
    Resolved(PathBuf),
}

impl Resolution {
    /// The resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Resolved(path) => Some(path),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotApplicable => "not_applicable",
            Self::NotFound => "not_found",
            Self::Resolved(_) => "resolved",
        }
    }

    fn from_found(found: Option<PathBuf>) -> Self {
        found.map_or(Self::NotFound, Self::Resolved)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(path) => write!(f, "{}", path.display()),
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Resolver for prefixed fallback requests.
#[derive(Debug)]
pub struct FallbackResolver {
    options: ResolverOptions,
    pattern: Regex,
    cache: ResolutionCache,
    probe: Arc<dyn ExistenceProbe>,
}

impl FallbackResolver {
    /// Build a resolver that probes the real filesystem.
    pub fn new(options: FallbackOptions) -> Result<Self, Error> {
        Self::with_probe(options, Arc::new(FsProbe))
    }

    /// Build a resolver with a custom existence probe.
    pub fn with_probe(
        options: FallbackOptions,
        probe: Arc<dyn ExistenceProbe>,
    ) -> Result<Self, Error> {
        let options = ResolverOptions::from_partial(options);
        let pattern = options.matcher.compile(&options.prefix)?;

        debug!(
            prefix = %options.prefix,
            pattern = %pattern.as_str(),
            directories = options.directories.len(),
            extensions = options.extensions.len(),
            "Fallback resolver configured"
        );

        Ok(Self {
            options,
            pattern,
            cache: ResolutionCache::new(),
            probe,
        })
    }

    #[must_use]
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// The compiled prefix pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Whether `request` carries the fallback prefix.
    #[must_use]
    pub fn matches_prefix(&self, request: &str) -> bool {
        self.pattern.is_match(request)
    }

    /// Remove the matched prefix from `request`.
    ///
    /// Returns `None` when the request does not match.
    #[must_use]
    pub fn strip_prefix(&self, request: &str) -> Option<String> {
        let m = self.pattern.find(request)?;
        let mut stripped = String::with_capacity(request.len() - m.len());
        stripped.push_str(&request[..m.start()]);
        stripped.push_str(&request[m.end()..]);
        Some(stripped)
    }

    /// Candidate paths for an already stripped request, in probe order.
    #[must_use]
    pub fn candidates(&self, stripped: &str) -> Vec<PathBuf> {
        combine(stripped, &self.options.directories, &self.options.extensions)
    }

    /// Cache state for a stripped request path.
    #[must_use]
    pub fn cached(&self, stripped: &str) -> CacheState {
        self.cache.get(stripped)
    }

    /// Number of settled cache entries.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Resolve a request.
    pub fn resolve(&self, request: &str) -> Result<Resolution, Error> {
        self.resolve_inner(request, None)
    }

    /// Resolve a request and record every step taken.
    ///
    /// The trace is returned even when resolution fails, so the steps leading
    /// up to a probe failure stay visible.
    pub fn resolve_with_trace(&self, request: &str) -> (Result<Resolution, Error>, ResolveTrace) {
        let mut trace = ResolveTrace::new();
        let result = self.resolve_inner(request, Some(&mut trace));
        (result, trace)
    }

    /// Resolve a request from async code.
    ///
    /// Probing runs on the blocking pool; the resolution semantics are the
    /// same as [`FallbackResolver::resolve`].
    pub async fn resolve_async(self: &Arc<Self>, request: impl Into<String>) -> Result<Resolution, Error> {
        let request = request.into();
        if !self.matches_prefix(&request) {
            return Ok(Resolution::NotApplicable);
        }

        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.resolve(&request))
            .await
            .map_err(|e| Error::other(format!("resolution task failed: {e}")))?
    }

    fn resolve_inner(
        &self,
        request: &str,
        mut trace: Option<&mut ResolveTrace>,
    ) -> Result<Resolution, Error> {
        let Some(stripped) = self.strip_prefix(request) else {
            if let Some(t) = trace.as_deref_mut() {
                t.failure(
                    steps::MATCH_PREFIX,
                    format!("{request:?} does not match {}", self.pattern.as_str()),
                );
            }
            return Ok(Resolution::NotApplicable);
        };

        if let Some(t) = trace.as_deref_mut() {
            t.success(
                steps::MATCH_PREFIX,
                format!("{request:?} matches {}", self.pattern.as_str()),
            );
            t.success(steps::STRIP_PREFIX, format!("stripped path {stripped:?}"));
            if Path::new(&stripped).is_absolute() {
                t.add_warning(TraceWarning::new(
                    warning_codes::ABSOLUTE_REQUEST,
                    "stripped path is absolute; base directories are ignored",
                ));
            }
        }

        let lookup = self
            .cache
            .get_or_try_settle(&stripped, || self.probe_candidates(&stripped, &mut trace))?;

        if lookup.hit {
            debug!(request, stripped = %stripped, "Fallback cache hit");
        }

        let resolution = Resolution::from_found(lookup.found);

        if let Some(t) = trace.as_deref_mut() {
            if lookup.hit {
                t.success(steps::CACHE_LOOKUP, "cache hit");
            }
            let step = match resolution.path() {
                Some(path) => {
                    ResolveTraceStep::new(steps::FINAL_PATH, true, "resolved").with_path(path)
                }
                None => ResolveTraceStep::new(steps::FINAL_PATH, false, "no candidate exists"),
            };
            t.add_step(step);
        }

        Ok(resolution)
    }

    fn probe_candidates(
        &self,
        stripped: &str,
        trace: &mut Option<&mut ResolveTrace>,
    ) -> Result<Option<PathBuf>, Error> {
        if let Some(t) = trace.as_deref_mut() {
            t.failure(steps::CACHE_LOOKUP, "cache miss");
        }

        if self.options.directories.is_empty() {
            debug!(stripped, "No fallback directories configured");
            if let Some(t) = trace.as_deref_mut() {
                t.add_warning(TraceWarning::new(
                    warning_codes::NO_DIRECTORIES,
                    "no fallback directories configured",
                ));
            }
            return Ok(None);
        }

        for candidate in self.candidates(stripped) {
            let exists = match self.probe.exists(&candidate) {
                Ok(exists) => exists,
                Err(source) => {
                    debug!(path = %candidate.display(), error = %source, "Probe failed");
                    if let Some(t) = trace.as_deref_mut() {
                        t.add_step(
                            ResolveTraceStep::new(steps::PROBE_CANDIDATE, false, "probe failed")
                                .with_path(&candidate)
                                .with_note(source.to_string()),
                        );
                    }
                    return Err(Error::Probe {
                        path: candidate,
                        source,
                    });
                }
            };

            trace!(path = %candidate.display(), exists, "Probed candidate");
            if let Some(t) = trace.as_deref_mut() {
                let detail = if exists { "exists" } else { "missing" };
                t.add_step(
                    ResolveTraceStep::new(steps::PROBE_CANDIDATE, exists, detail)
                        .with_path(&candidate),
                );
            }

            if exists {
                debug!(stripped, resolved = %candidate.display(), "Fallback resolved");
                return Ok(Some(candidate));
            }
        }

        debug!(stripped, "No fallback candidate exists");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::options::Matcher;
    use crate::resolver::probe::testing::CountingProbe;
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    fn resolver(options: FallbackOptions, probe: &Arc<CountingProbe>) -> FallbackResolver {
        FallbackResolver::with_probe(options, Arc::clone(probe) as Arc<dyn ExistenceProbe>)
            .unwrap()
    }

    #[test]
    fn test_matches_prefix_default() {
        let r = FallbackResolver::new(FallbackOptions::new()).unwrap();
        assert!(r.matches_prefix("#fallback#/x"));
        assert!(!r.matches_prefix("fallback/x"));
        assert!(!r.matches_prefix("#other#/x"));
        assert!(!r.matches_prefix("./#fallback#/x"));
    }

    #[test]
    fn test_matches_custom_prefix() {
        let r = FallbackResolver::new(FallbackOptions::new().with_prefix("theme")).unwrap();
        assert!(r.matches_prefix("#theme#/Button"));
        assert!(!r.matches_prefix("#fallback#/Button"));
    }

    #[test]
    fn test_strip_prefix() {
        let r = FallbackResolver::new(FallbackOptions::new()).unwrap();
        assert_eq!(
            r.strip_prefix("#fallback#/components/Button").as_deref(),
            Some("components/Button")
        );
        assert_eq!(r.strip_prefix("components/Button"), None);
    }

    #[test]
    fn test_invalid_prefix_fails_construction() {
        let err = FallbackResolver::new(FallbackOptions::new().with_prefix("a(b")).unwrap_err();
        assert!(matches!(err, Error::InvalidMatcher { .. }));
    }

    #[test]
    fn test_custom_matcher() {
        let r = FallbackResolver::new(
            FallbackOptions::new()
                .with_prefix("ui")
                .with_matcher(Matcher::new(|p| format!("^@{p}/"))),
        )
        .unwrap();
        assert!(r.matches_prefix("@ui/Button"));
        assert_eq!(r.strip_prefix("@ui/Button").as_deref(), Some("Button"));
    }

    #[test]
    fn test_not_applicable_never_probes() {
        let probe = Arc::new(CountingProbe::default());
        let r = resolver(FallbackOptions::new().with_directories(["/a"]), &probe);

        assert_eq!(r.resolve("./local").unwrap(), Resolution::NotApplicable);
        assert_eq!(r.resolve("#other#/x").unwrap(), Resolution::NotApplicable);
        assert_eq!(probe.calls(), 0);
        assert_eq!(r.cache_len(), 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_directory_outranks_extension() {
        let probe = Arc::new(CountingProbe::with_files(["/b/foo", "/a/foo.js"]));
        let r = resolver(
            FallbackOptions::new()
                .with_directories(["/a", "/b"])
                .with_extensions([".js"]),
            &probe,
        );

        assert_eq!(
            r.resolve("#fallback#/foo").unwrap(),
            Resolution::Resolved(PathBuf::from("/a/foo.js"))
        );
        assert_eq!(
            *probe.probed.lock().unwrap(),
            vec![PathBuf::from("/a/foo"), PathBuf::from("/a/foo.js")]
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_nth_candidate_and_cache_hit() {
        let probe = Arc::new(CountingProbe::with_files(["/b/x.ts"]));
        let r = resolver(
            FallbackOptions::new()
                .with_directories(["/a", "/b"])
                .with_extensions([".js", ".ts"]),
            &probe,
        );

        let first = r.resolve("#fallback#/x").unwrap();
        assert_eq!(first, Resolution::Resolved(PathBuf::from("/b/x.ts")));
        // /a/x, /a/x.js, /a/x.ts, /b/x, /b/x.js, /b/x.ts
        assert_eq!(probe.calls(), 6);

        let second = r.resolve("#fallback#/x").unwrap();
        assert_eq!(second, first);
        assert_eq!(probe.calls(), 6);
        assert_eq!(r.cached("x"), CacheState::Resolved(PathBuf::from("/b/x.ts")));
    }

    #[test]
    #[cfg(unix)]
    fn test_not_found_is_cached() {
        let probe = Arc::new(CountingProbe::default());
        let r = resolver(
            FallbackOptions::new()
                .with_directories(["/a", "/b"])
                .with_extensions([".js"]),
            &probe,
        );

        assert_eq!(r.resolve("#fallback#/missing").unwrap(), Resolution::NotFound);
        assert_eq!(probe.calls(), 4);

        assert_eq!(r.resolve("#fallback#/missing").unwrap(), Resolution::NotFound);
        assert_eq!(probe.calls(), 4);
        assert_eq!(r.cached("missing"), CacheState::NotFound);
    }

    #[test]
    fn test_empty_directories_not_found_without_probing() {
        let probe = Arc::new(CountingProbe::default());
        let r = resolver(
            FallbackOptions::new().with_directories(Vec::<PathBuf>::new()),
            &probe,
        );

        assert_eq!(r.resolve("#fallback#/x").unwrap(), Resolution::NotFound);
        assert_eq!(r.cached("x"), CacheState::NotFound);
        assert_eq!(probe.calls(), 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_probe_error_is_not_cached() {
        let probe = Arc::new(CountingProbe::with_files(["/b/x"]));
        probe.fail_on("/a/x");
        let r = resolver(FallbackOptions::new().with_directories(["/a", "/b"]), &probe);

        let err = r.resolve("#fallback#/x").unwrap_err();
        assert!(matches!(err, Error::Probe { .. }));
        assert!(err.is_transient());
        assert_eq!(r.cached("x"), CacheState::Unresolved);

        probe.heal();
        assert_eq!(
            r.resolve("#fallback#/x").unwrap(),
            Resolution::Resolved(PathBuf::from("/b/x"))
        );
        // one failed probe, then /a/x and /b/x
        assert_eq!(probe.calls(), 3);
    }

    #[test]
    fn test_instances_are_independent() {
        let probe = Arc::new(CountingProbe::default());
        let with_dirs = resolver(
            FallbackOptions::new().with_root("/").with_directories(["/themes/a"]),
            &probe,
        );
        let defaults = resolver(FallbackOptions::new(), &probe);

        assert_eq!(with_dirs.options().directories.len(), 1);
        assert!(defaults.options().directories.is_empty());
        assert_eq!(defaults.resolve("#fallback#/x").unwrap(), Resolution::NotFound);
        assert_eq!(probe.calls(), 0);
    }

    #[test]
    fn test_resolves_on_disk() {
        let dir = tempdir().unwrap();
        let custom = dir.path().join("custom");
        let default = dir.path().join("default");
        fs::create_dir_all(custom.join("components")).unwrap();
        fs::create_dir_all(default.join("components")).unwrap();
        fs::write(default.join("components/Button.js"), "").unwrap();
        fs::write(default.join("components/Card.js"), "").unwrap();
        fs::write(custom.join("components/Card.js"), "").unwrap();

        let r = FallbackResolver::new(
            FallbackOptions::new()
                .with_root(dir.path())
                .with_directories(["custom", "default"])
                .with_extensions([".js"]),
        )
        .unwrap();

        assert_eq!(
            r.resolve("#fallback#/components/Button").unwrap(),
            Resolution::Resolved(default.join("components/Button.js"))
        );
        assert_eq!(
            r.resolve("#fallback#/components/Card").unwrap(),
            Resolution::Resolved(custom.join("components/Card.js"))
        );
        assert_eq!(
            r.resolve("#fallback#/components/Nav").unwrap(),
            Resolution::NotFound
        );
    }

    #[test]
    fn test_cache_ignores_later_disk_changes() {
        let dir = tempdir().unwrap();
        let r = FallbackResolver::new(FallbackOptions::new().with_directories([dir.path()]))
            .unwrap();

        assert_eq!(r.resolve("#fallback#/late.js").unwrap(), Resolution::NotFound);
        fs::write(dir.path().join("late.js"), "").unwrap();
        assert_eq!(r.resolve("#fallback#/late.js").unwrap(), Resolution::NotFound);
    }

    #[test]
    #[cfg(unix)]
    fn test_trace_records_probes_and_hit() {
        let probe = Arc::new(CountingProbe::with_files(["/b/x.js"]));
        let r = resolver(
            FallbackOptions::new()
                .with_directories(["/a", "/b"])
                .with_extensions([".js"]),
            &probe,
        );

        let (resolution, trace) = r.resolve_with_trace("#fallback#/x");
        let resolution = resolution.unwrap();
        assert!(resolution.is_resolved());
        let probed: Vec<_> = trace.probed().cloned().collect();
        assert_eq!(
            probed,
            vec![
                PathBuf::from("/a/x"),
                PathBuf::from("/a/x.js"),
                PathBuf::from("/b/x"),
                PathBuf::from("/b/x.js")
            ]
        );

        let (_, trace) = r.resolve_with_trace("#fallback#/x");
        assert_eq!(trace.probed().count(), 0);
        assert!(trace
            .steps
            .iter()
            .any(|s| s.step == steps::CACHE_LOOKUP && s.ok));
    }

    #[test]
    fn test_trace_not_applicable_and_no_directories() {
        let r = FallbackResolver::new(FallbackOptions::new()).unwrap();

        let (resolution, trace) = r.resolve_with_trace("lodash");
        assert_eq!(resolution.unwrap(), Resolution::NotApplicable);
        assert_eq!(trace.steps.len(), 1);
        assert!(!trace.steps[0].ok);

        let (_, trace) = r.resolve_with_trace("#fallback#/x");
        assert!(trace
            .warnings
            .iter()
            .any(|w| w.code == warning_codes::NO_DIRECTORIES));
    }

    #[test]
    #[cfg(unix)]
    fn test_trace_kept_on_probe_failure() {
        let probe = Arc::new(CountingProbe::with_files(["/b/x"]));
        probe.fail_on("/a/x.js");
        let r = resolver(
            FallbackOptions::new()
                .with_directories(["/a", "/b"])
                .with_extensions([".js"]),
            &probe,
        );

        let (result, trace) = r.resolve_with_trace("#fallback#/x");
        assert!(matches!(result, Err(Error::Probe { .. })));

        let probed: Vec<_> = trace.probed().cloned().collect();
        assert_eq!(probed, vec![PathBuf::from("/a/x"), PathBuf::from("/a/x.js")]);

        let failed = trace
            .steps
            .iter()
            .find(|s| s.step == steps::PROBE_CANDIDATE && s.detail == "probe failed")
            .unwrap();
        assert_eq!(failed.path.as_deref(), Some(Path::new("/a/x.js")));
        assert!(!failed.notes.is_empty());
        assert_eq!(r.cached("x"), CacheState::Unresolved);
    }

    #[test]
    #[cfg(unix)]
    fn test_concurrent_resolves_probe_once() {
        let probe = Arc::new(
            CountingProbe::with_files(["/b/x"]).with_delay(Duration::from_millis(10)),
        );
        let r = Arc::new(resolver(
            FallbackOptions::new().with_directories(["/a", "/b"]),
            &probe,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = Arc::clone(&r);
                thread::spawn(move || r.resolve("#fallback#/x").unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.join().unwrap(),
                Resolution::Resolved(PathBuf::from("/b/x"))
            );
        }
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test]
    async fn test_resolve_async() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("theme.css"), "").unwrap();

        let r = Arc::new(
            FallbackResolver::new(
                FallbackOptions::new()
                    .with_directories([dir.path()])
                    .with_extensions([".css"]),
            )
            .unwrap(),
        );

        assert_eq!(
            r.resolve_async("#fallback#/theme").await.unwrap(),
            Resolution::Resolved(dir.path().join("theme.css"))
        );
        assert_eq!(
            r.resolve_async("theme").await.unwrap(),
            Resolution::NotApplicable
        );
        assert_eq!(r.cache_len(), 1);
    }

    #[test]
    fn test_resolution_display() {
        assert_eq!(Resolution::NotFound.to_string(), "not_found");
        assert_eq!(Resolution::NotApplicable.as_str(), "not_applicable");
        assert_eq!(Resolution::Resolved(PathBuf::from("x")).to_string(), "x");
    }
}
