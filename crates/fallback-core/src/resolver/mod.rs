//! Fallback path resolver.
//!
//! Strips a `#<prefix>#/` marker from a request, searches prioritized base
//! directories (with optional extension suffixes), and returns the first
//! candidate that exists. Results are memoized per stripped path.

mod cache;
mod combine;
mod fallback;
mod options;
mod probe;
pub mod trace;

pub use cache::{CacheLookup, CacheState, ResolutionCache};
pub use combine::combine;
pub use fallback::{FallbackResolver, Resolution};
pub use options::{
    default_pattern, FallbackOptions, Matcher, ResolverOptions, DEFAULT_PREFIX, PREFIX_PLACEHOLDER,
};
pub use probe::{ExistenceProbe, FsProbe};
pub use trace::{
    steps as trace_steps, warning_codes as trace_warning_codes, ResolveTrace, ResolveTraceStep,
    TraceWarning, EXPLAIN_SCHEMA_VERSION,
};
