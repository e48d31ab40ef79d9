//! Resolver configuration.
//!
//! `FallbackOptions` is the partial, user-facing form: every field is
//! optional and absent fields take their defaults. `ResolverOptions` is the
//! fully merged form the resolver runs with. Defaults are produced fresh by
//! [`ResolverOptions::defaults`] for every construction.

use crate::error::Error;
use fallback_util::fs::absolutize;
use regex_lite::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default request prefix token.
pub const DEFAULT_PREFIX: &str = "fallback";

/// Placeholder substituted by [`Matcher::template`].
pub const PREFIX_PLACEHOLDER: &str = "{prefix}";

/// Default matcher pattern: the request starts with `#<prefix>#/`.
#[must_use]
pub fn default_pattern(prefix: &str) -> String {
    format!("^#{prefix}#/")
}

/// Derives a prefix-detection regex pattern from the configured prefix.
#[derive(Clone)]
pub struct Matcher {
    build: Arc<dyn Fn(&str) -> String + Send + Sync>,
    label: &'static str,
}

impl Matcher {
    /// Create a matcher from an arbitrary pattern function.
    pub fn new(build: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            build: Arc::new(build),
            label: "custom",
        }
    }

    /// Create a matcher from a pattern template where `{prefix}` is replaced
    /// by the prefix (e.g. `^@{prefix}/`).
    pub fn template(template: impl Into<String>) -> Self {
        let template = template.into();
        Self {
            build: Arc::new(move |prefix| template.replace(PREFIX_PLACEHOLDER, prefix)),
            label: "template",
        }
    }

    /// The pattern this matcher derives for `prefix`.
    #[must_use]
    pub fn pattern(&self, prefix: &str) -> String {
        (self.build)(prefix)
    }

    /// Derive and compile the pattern for `prefix`.
    pub fn compile(&self, prefix: &str) -> Result<Regex, Error> {
        let pattern = self.pattern(prefix);
        Regex::new(&pattern).map_err(|source| Error::InvalidMatcher {
            prefix: prefix.to_string(),
            pattern,
            source,
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            build: Arc::new(default_pattern),
            label: "default",
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher").field("kind", &self.label).finish()
    }
}

/// Partial resolver configuration.
///
/// Absent fields fall back to defaults; present fields are taken as given,
/// including explicitly empty lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FallbackOptions {
    /// Base directories, highest priority first.
    pub directories: Option<Vec<PathBuf>>,
    /// Prefix token (`fallback` in `#fallback#/x`).
    pub prefix: Option<String>,
    /// Suffixes tried after the bare path, in order.
    pub extensions: Option<Vec<String>>,
    /// Pattern template with a `{prefix}` placeholder.
    pub pattern: Option<String>,
    /// Base for relative directories.
    pub root: Option<PathBuf>,
    /// Programmatic matcher; takes precedence over `pattern`.
    #[serde(skip)]
    pub matcher: Option<Matcher>,
}

impl FallbackOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn with_directories<I, P>(mut self, directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.directories = Some(directories.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Layer `overrides` on top of `self`, field by field.
    #[must_use]
    pub fn overlay(self, overrides: FallbackOptions) -> Self {
        Self {
            directories: overrides.directories.or(self.directories),
            prefix: overrides.prefix.or(self.prefix),
            extensions: overrides.extensions.or(self.extensions),
            pattern: overrides.pattern.or(self.pattern),
            root: overrides.root.or(self.root),
            matcher: overrides.matcher.or(self.matcher),
        }
    }
}

/// Fully resolved resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Absolute base directories, highest priority first.
    pub directories: Vec<PathBuf>,
    pub prefix: String,
    pub extensions: Vec<String>,
    pub matcher: Matcher,
    /// Base the directories were made absolute against.
    pub root: PathBuf,
}

impl ResolverOptions {
    /// A fresh defaults value.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            directories: Vec::new(),
            prefix: DEFAULT_PREFIX.to_string(),
            extensions: Vec::new(),
            matcher: Matcher::default(),
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Merge partial options over a fresh defaults value.
    #[must_use]
    pub fn from_partial(partial: FallbackOptions) -> Self {
        let defaults = Self::defaults();
        let root = partial.root.unwrap_or(defaults.root);

        let matcher = match (partial.matcher, partial.pattern) {
            (Some(matcher), _) => matcher,
            (None, Some(template)) => Matcher::template(template),
            (None, None) => defaults.matcher,
        };

        let directories = partial
            .directories
            .unwrap_or(defaults.directories)
            .iter()
            .map(|dir| absolutize(dir, &root))
            .collect();

        Self {
            directories,
            prefix: partial.prefix.unwrap_or(defaults.prefix),
            extensions: partial.extensions.unwrap_or(defaults.extensions),
            matcher,
            root,
        }
    }
}
