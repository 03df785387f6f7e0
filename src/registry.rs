//! Ordered handler registry.
//!
//! Shared by session hooks and emitter events: maps a key to the handlers
//! registered under it, in registration order. Callers take a snapshot of
//! the handlers and invoke them after releasing their lock, so a handler
//! may register or remove handlers (or send) without deadlocking.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::identifiers::HandlerId;

// ============================================================================
// HandlerRegistry
// ============================================================================

/// Map of key to ordered handler list.
pub(crate) struct HandlerRegistry<K, F: ?Sized> {
    entries: FxHashMap<K, Vec<(HandlerId, Arc<F>)>>,
}

impl<K, F: ?Sized> Default for HandlerRegistry<K, F> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<K: Eq + Hash, F: ?Sized> HandlerRegistry<K, F> {
    /// Appends a handler under `key`.
    pub(crate) fn insert(&mut self, key: K, handler: Arc<F>) -> HandlerId {
        let id = HandlerId::next();
        self.entries.entry(key).or_default().push((id, handler));
        id
    }

    /// Removes the handler `id` from `key`.
    ///
    /// Returns `false` if no such handler was registered.
    pub(crate) fn remove<Q>(&mut self, key: &Q, id: HandlerId) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(handlers) = self.entries.get_mut(key) else {
            return false;
        };

        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        let removed = handlers.len() != before;

        if handlers.is_empty() {
            self.entries.remove(key);
        }

        removed
    }

    /// Snapshot of the handlers under `key`, in registration order.
    pub(crate) fn snapshot<Q>(&self, key: &Q) -> Vec<Arc<F>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries
            .get(key)
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default()
    }

    /// Number of handlers under `key`.
    pub(crate) fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map_or(0, Vec::len)
    }
}

// ============================================================================
// Tests
// ============================================================================
