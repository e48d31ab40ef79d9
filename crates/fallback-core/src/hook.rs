//! Host integration for module-resolution pipelines.
//!
//! A host (a bundler's resolver, a dev server, a test harness) exposes a
//! single "module" stage. Hooks tapped into that stage see each request and
//! either rewrite it or let it pass through to the host's next step.
//!
//! ## Example
//!
//! ```ignore
//! use fallback_core::hook::{HookRegistry, ResolveRequest};
//! use fallback_core::resolver::{FallbackOptions, FallbackResolver};
//! use std::sync::Arc;
//!
//! let resolver = Arc::new(FallbackResolver::new(
//!     FallbackOptions::new().with_directories(["src/custom", "src/default"]),
//! )?);
//!
//! let mut registry = HookRegistry::new();
//! resolver.apply(&mut registry);
//!
//! let action = registry.dispatch(&ResolveRequest::new("#fallback#/Button"))?;
//! ```

use crate::error::Error;
use crate::resolver::{FallbackResolver, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Result type for hooks.
pub type HookResult<T> = Result<T, Error>;

/// Name the fallback resolver registers its hook under.
pub const HOOK_NAME: &str = "FallbackDirectoryResolverPlugin";

/// A request flowing through the host's module stage.
///
/// Only `request` is interpreted; the other fields are carried along
/// unchanged when the request is rewritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// The request target (specifier or path).
    pub request: String,
    /// Directory the request originates from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Sub-path associated with the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Query string (e.g. `?inline`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Host-specific metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ResolveRequest {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Copy of this request with `target` as the new request.
    #[must_use]
    pub fn retarget(&self, target: &Path) -> Self {
        Self {
            request: target.to_string_lossy().into_owned(),
            ..self.clone()
        }
    }
}

/// What a hook wants the host to do with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum HookAction {
    /// Continue resolution with `request` and log `message`.
    Rewrite {
        request: ResolveRequest,
        message: String,
    },
    /// Leave the request to the host's next step.
    PassThrough,
}

/// A hook tapped into the host's module stage.
pub trait ModuleHook: Send + Sync {
    fn on_module(&self, request: &ResolveRequest) -> HookResult<HookAction>;
}

/// A host that accepts module-stage hooks.
pub trait ResolverHost {
    fn tap_module(&mut self, name: &'static str, hook: Arc<dyn ModuleHook>);
}

impl ModuleHook for FallbackResolver {
    fn on_module(&self, request: &ResolveRequest) -> HookResult<HookAction> {
        match self.resolve(&request.request)? {
            Resolution::Resolved(path) => {
                let message = format!("resolve {} to {}", request.request, path.display());
                debug!("{message}");
                Ok(HookAction::Rewrite {
                    request: request.retarget(&path),
                    message,
                })
            }
            Resolution::NotFound => {
                info!(request = %request.request, "No fallback candidate found, passing through");
                Ok(HookAction::PassThrough)
            }
            Resolution::NotApplicable => Ok(HookAction::PassThrough),
        }
    }
}

impl FallbackResolver {
    /// Register this resolver with `host`.
    pub fn apply(self: Arc<Self>, host: &mut dyn ResolverHost) {
        host.tap_module(HOOK_NAME, self);
    }
}

/// In-process host: runs tapped hooks in registration order.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<(&'static str, Arc<dyn ModuleHook>)>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of registered hooks, in dispatch order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.hooks.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run `request` through the hooks. The first rewrite wins.
    pub fn dispatch(&self, request: &ResolveRequest) -> HookResult<HookAction> {
        for (name, hook) in &self.hooks {
            let action = hook.on_module(request)?;
            if let HookAction::Rewrite { ref message, .. } = action {
                debug!(hook = *name, "{message}");
                return Ok(action);
            }
        }
        Ok(HookAction::PassThrough)
    }
}

impl ResolverHost for HookRegistry {
    fn tap_module(&mut self, name: &'static str, hook: Arc<dyn ModuleHook>) {
        self.hooks.push((name, hook));
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
