//! Client-local record of keys believed to exist on the remote service
//!
//! The driver needs O(1) membership updates and O(1) uniform random
//! selection, so the set is a backing vector of keys plus a reverse index
//! from key to vector position. Removal swaps the victim with the last
//! element and reindexes the moved key.

use crate::common::{Error, Result};
use bytes::Bytes;
use rand::Rng;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Random-access set of tracked keys
///
/// Best-effort only: it is mutated solely by this client and may under- or
/// over-approximate what the server actually holds.
#[derive(Debug, Default)]
pub struct KnownKeys {
    keys: Vec<Bytes>,
    index: HashMap<Bytes, usize>,
}

impl KnownKeys {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert a key. Returns true iff the key was newly inserted.
    pub fn add(&mut self, key: Bytes) -> bool {
        match self.index.entry(key.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(self.keys.len());
                self.keys.push(key);
                true
            }
        }
    }

    /// Remove a key. No-op when the key is not tracked.
    pub fn remove(&mut self, key: &[u8]) {
        let idx = match self.index.remove(key) {
            Some(idx) => idx,
            None => return,
        };

        self.keys.swap_remove(idx);
        if idx < self.keys.len() {
            // The former last key now lives at idx; reindex it.
            self.index.insert(self.keys[idx].clone(), idx);
        }
    }

    /// Check if a key is tracked
    pub fn contains(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Pick a uniformly random tracked key.
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Bytes> {
        if self.keys.is_empty() {
            return Err(Error::EmptyKeySet);
        }
        let idx = rng.gen_range(0..self.keys.len());
        Ok(self.keys[idx].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn test_add_remove_membership() {
        let mut keys = KnownKeys::new();
        assert!(keys.is_empty());

        assert!(keys.add(key("a")));
        assert!(keys.add(key("b")));
        assert!(!keys.is_empty());
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(b"a"));
        assert!(keys.contains(b"b"));

        keys.remove(b"a");
        assert_eq!(keys.len(), 1);
        assert!(!keys.contains(b"a"));
        assert!(keys.contains(b"b"));

        keys.remove(b"b");
        assert!(keys.is_empty());
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut keys = KnownKeys::new();
        assert!(keys.add(key("a")));
        assert!(!keys.add(key("a")));
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut keys = KnownKeys::new();
        keys.add(key("a"));
        keys.remove(b"missing");
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(b"a"));
    }

    #[test]
    fn test_pick_random_on_empty_fails() {
        let keys = KnownKeys::new();
        let err = keys.pick_random(&mut rand::thread_rng()).unwrap_err();
        assert!(matches!(err, Error::EmptyKeySet));
    }

    #[test]
    fn test_pick_random_returns_member() {
        let mut keys = KnownKeys::new();
        keys.add(key("a"));
        keys.add(key("b"));
        keys.add(key("c"));

        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let picked = keys.pick_random(&mut rng).unwrap();
            assert!(keys.contains(&picked));
        }
    }

    #[test]
    fn test_pick_then_remove() {
        let mut keys = KnownKeys::new();
        keys.add(key("a"));
        keys.add(key("b"));

        let picked = keys.pick_random(&mut rand::thread_rng()).unwrap();
        keys.remove(&picked);
        assert!(!keys.contains(&picked));
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_remove_leaves_exact_remainder() {
        let mut keys = KnownKeys::new();
        keys.add(key("a"));
        keys.add(key("b"));
        keys.remove(b"a");

        // Only "b" is left, so every pick must return it.
        for _ in 0..10 {
            let picked = keys.pick_random(&mut rand::thread_rng()).unwrap();
            assert_eq!(&picked[..], b"b");
        }
    }

    #[test]
    fn test_swap_remove_keeps_index_consistent() {
        let mut keys = KnownKeys::new();
        for i in 0..100u32 {
            keys.add(Bytes::from(i.to_be_bytes().to_vec()));
        }
        for i in (0..100u32).step_by(2) {
            keys.remove(&i.to_be_bytes());
        }

        assert_eq!(keys.len(), 50);
        for i in 0..100u32 {
            assert_eq!(keys.contains(&i.to_be_bytes()), i % 2 == 1);
        }

        // Picks only ever see surviving keys.
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let picked = keys.pick_random(&mut rng).unwrap();
            let i = u32::from_be_bytes(picked[..].try_into().unwrap());
            assert_eq!(i % 2, 1);
        }
    }

    #[test]
    fn test_pick_random_reaches_all_members() {
        let mut keys = KnownKeys::new();
        keys.add(key("a"));
        keys.add(key("b"));
        keys.add(key("c"));

        let mut seen = std::collections::HashSet::new();
        let mut rng = rand::thread_rng();
        for _ in 0..300 {
            seen.insert(keys.pick_random(&mut rng).unwrap());
        }
        assert_eq!(seen.len(), 3);
    }
}
