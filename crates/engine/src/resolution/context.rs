//! Per-operation cache and in-flight tracker for graph resolution.
//!
//! Entries are keyed by [`CompositeKey::fingerprint`]. A context lives for one
//! top-level materialization unless the caller shares it across a batch.

use dashmap::{DashMap, DashSet};
use docgraph_domain::{CompositeKey, DomainItem};

#[derive(Debug, Default)]
pub struct ResolutionContext {
    cache: DashMap<String, DomainItem>,
    in_progress: DashSet<String>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as being resolved. Returns `false` if it already was.
    pub fn mark_in_progress(&self, key: &CompositeKey) -> bool {
        self.in_progress.insert(key.fingerprint())
    }

    pub fn mark_complete(&self, key: &CompositeKey) {
        self.in_progress.remove(&key.fingerprint());
    }

    pub fn is_in_progress(&self, key: &CompositeKey) -> bool {
        self.in_progress.contains(&key.fingerprint())
    }

    pub fn set_cached(&self, key: &CompositeKey, item: DomainItem) {
        self.cache.insert(key.fingerprint(), item);
    }

    pub fn is_cached(&self, key: &CompositeKey) -> bool {
        self.cache.contains_key(&key.fingerprint())
    }

    pub fn get_cached(&self, key: &CompositeKey) -> Option<DomainItem> {
        self.cache
            .get(&key.fingerprint())
            .map(|entry| entry.value().clone())
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn in_progress_len(&self) -> usize {
        self.in_progress.len()
    }

    /// Mark `key` in progress for the guard's lifetime.
    ///
    /// If the key was already marked by an outer frame, the guard leaves that
    /// mark alone when dropped.
    pub fn enter(&self, key: &CompositeKey) -> InProgressGuard<'_> {
        let fingerprint = key.fingerprint();
        let owned = self.in_progress.insert(fingerprint.clone());
        InProgressGuard {
            context: self,
            fingerprint,
            owned,
        }
    }

    /// Like [`enter`](Self::enter), but `None` when the key is already in flight.
    pub fn try_enter(&self, key: &CompositeKey) -> Option<InProgressGuard<'_>> {
        let guard = self.enter(key);
        guard.owned.then_some(guard)
    }
}

/// Marks a key complete when dropped, whether resolution returned, failed,
/// panicked or was cancelled.
#[derive(Debug)]
pub struct InProgressGuard<'a> {
    context: &'a ResolutionContext,
    fingerprint: String,
    owned: bool,
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        if self.owned {
            self.context.in_progress.remove(&self.fingerprint);
        }
    }
}
