//! Populate-once resolution cache.
//!
//! Keys are stripped request paths. Each key owns a slot that moves from
//! `Unresolved` to a terminal state exactly once. The slot lock is held while
//! its value is computed, so concurrent lookups of the same key wait for the
//! in-flight computation instead of repeating it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// State of one cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CacheState {
    /// Never settled (or only failed attempts so far).
    #[default]
    Unresolved,
    Resolved(PathBuf),
    NotFound,
}

impl CacheState {
    fn settled(found: Option<PathBuf>) -> Self {
        match found {
            Some(path) => Self::Resolved(path),
            None => Self::NotFound,
        }
    }

    fn as_found(&self) -> Option<Option<PathBuf>> {
        match self {
            Self::Unresolved => None,
            Self::Resolved(path) => Some(Some(path.clone())),
            Self::NotFound => Some(None),
        }
    }
}

/// A settled lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLookup {
    /// `Some` when a candidate was found.
    pub found: Option<PathBuf>,
    /// Whether the value came from the cache rather than this call.
    pub hit: bool,
}

#[derive(Debug, Default)]
struct Slot {
    state: Mutex<CacheState>,
}

/// Thread-safe resolution cache keyed by stripped request path.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    slots: RwLock<HashMap<String, Arc<Slot>>>,
    settled: AtomicUsize,
}

impl ResolutionCache {
    /// Create a new empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for `key`.
    pub fn get(&self, key: &str) -> CacheState {
        let slot = {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            slots.get(key).cloned()
        };
        match slot {
            Some(slot) => slot
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            None => CacheState::Unresolved,
        }
    }

    /// Return the settled value for `key`, computing it with `settle` if the
    /// slot is still unresolved.
    ///
    /// `settle` runs at most once per successful settlement; an `Err` leaves
    /// the slot unresolved so the next caller tries again.
    pub fn get_or_try_settle<F, E>(&self, key: &str, settle: F) -> Result<CacheLookup, E>
    where
        F: FnOnce() -> Result<Option<PathBuf>, E>,
    {
        let slot = self.slot(key);
        let mut state = slot.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(found) = state.as_found() {
            return Ok(CacheLookup { found, hit: true });
        }

        let found = settle()?;
        *state = CacheState::settled(found.clone());
        self.settled.fetch_add(1, Ordering::Relaxed);
        Ok(CacheLookup { found, hit: false })
    }

    /// Number of settled entries.
    pub fn len(&self) -> usize {
        self.settled.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &str) -> Arc<Slot> {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(key) {
                return Arc::clone(slot);
            }
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.to_string()).or_default())
    }
}
