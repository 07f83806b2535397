//! In-process deduplication of post identifiers
//!
//! The set only grows. A post is marked before it is extracted, so a post
//! classified as non-hiring is never re-extracted even if its content changes.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Set of post identifiers already processed by this scanner
#[derive(Debug, Default)]
pub struct DedupStore {
    seen: Mutex<HashSet<String>>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an identifier was already processed
    pub fn has(&self, id: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Record an identifier as processed
    pub fn add(&self, id: &str) {
        self.mark(id);
    }

    /// Atomically check and record an identifier.
    ///
    /// Returns `true` only for the first caller with a given id, so two
    /// concurrent scans never both process the same post.
    pub fn mark(&self, id: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        if seen.contains(id) {
            return false;
        }
        seen.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_has_and_add() {
        let store = DedupStore::new();
        assert!(!store.has("urn:li:activity:1"));
        store.add("urn:li:activity:1");
        assert!(store.has("urn:li:activity:1"));
        store.add("urn:li:activity:1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_mark_first_caller_wins() {
        let store = DedupStore::new();
        assert!(store.mark("a"));
        assert!(!store.mark("a"));
        assert!(store.mark("b"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_marks() {
        let store = Arc::new(DedupStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || (0..100).filter(|i| store.mark(&i.to_string())).count())
            })
            .collect();

        let claimed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(claimed, 100);
        assert_eq!(store.len(), 100);
    }
}
