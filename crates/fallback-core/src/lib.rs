#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::must_use_candidate)]

//! Fallback path resolution for prefixed module requests.

pub mod config;
pub mod error;
pub mod hook;
pub mod resolver;
pub mod version;

pub use config::Config;
pub use error::Error;
pub use hook::{HookAction, HookRegistry, ModuleHook, ResolveRequest, ResolverHost};
pub use resolver::{
    combine, CacheState, ExistenceProbe, FallbackOptions, FallbackResolver, FsProbe, Matcher,
    Resolution, ResolverOptions,
};
pub use version::VERSION;
