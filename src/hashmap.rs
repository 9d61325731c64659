//! Progressive-rehash hash map.
//!
//! Rust port of `original_source/hashmap/HMap.hpp` / `HMap.cpp`. Rather than
//! stopping the world to rehash every entry into a bigger table at once, the
//! C++ source keeps an "older" and a "newer" `HTable` side by side and moves
//! a bounded batch of entries from older to newer on every operation, so no
//! single call pays for the whole rehash. This crate keeps that exact policy,
//! built on [`crate::hashtable::HashTable`] instead of raw intrusive chains.
//!
//! | Rust item                    | C++ equivalent         |
//! |--------------------------------|--------------------------|
//! | [`HashMap::insert`]          | `HMap::insert`           |
//! | [`HashMap::lookup`]          | `HMap::lookup`           |
//! | [`HashMap::remove`]          | `HMap::remove`           |
//! | `HashMap::trigger_rehashing` | `HMap::trigger_rehashing` |
//! | `HashMap::help_rehashing`    | `HMap::help_rehashing`   |

use crate::hashtable::HashTable;

/// Initial bucket count for a freshly created map, before any growth.
pub const INITIAL_SLOTS: usize = 8;
/// Average chain length, measured as `len / n_buckets`, that triggers a
/// resize into a table twice the current bucket count.
pub const MAX_LOAD_FACTOR: usize = 8;
/// Number of entries migrated from the older table to the newer one on each
/// mutating call, bounding the worst-case latency of any single operation.
pub const REHASH_BATCH: usize = 128;

/// A hash map from byte-string keys to `V`, keyed by FNV-1 hash
/// ([`crate::hash::str_hash`]) with progressive, amortized resizing.
pub struct HashMap<V> {
    newer: HashTable<(Vec<u8>, V)>,
    older: Option<HashTable<(Vec<u8>, V)>>,
}

impl<V> Default for HashMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashMap<V> {
    pub fn new() -> Self {
        HashMap {
            newer: HashTable::new(INITIAL_SLOTS),
            older: None,
        }
    }

    pub fn len(&self) -> usize {
        self.newer.len() + self.older.as_ref().map_or(0, HashTable::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up `key`, checking the newer table first and falling back to
    /// the older one if a rehash is in progress. Also advances any
    /// in-progress migration by [`REHASH_BATCH`] entries, matching
    /// `HMap::lookup`'s call to `migrate_keys` so a read-only workload still
    /// finishes migrating rather than paying the double-table probe forever.
    pub fn lookup(&mut self, key: &[u8]) -> Option<&V> {
        self.help_rehashing();
        let hval = crate::hash::str_hash(key);
        if let Some(found) = self.newer.lookup(hval, |(k, _)| k == key) {
            return Some(&found.1);
        }
        self.older
            .as_ref()
            .and_then(|t| t.lookup(hval, |(k, _)| k == key))
            .map(|(_, v)| v)
    }

    /// Like [`HashMap::lookup`], but returns a mutable reference, letting a
    /// caller mutate an existing value (e.g. a registered `SortedSet`)
    /// in place instead of removing and reinserting it.
    pub fn lookup_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let hval = crate::hash::str_hash(key);
        if self.newer.lookup_mut(hval, |(k, _)| k == key).is_some() {
            return self
                .newer
                .lookup_mut(hval, |(k, _)| k == key)
                .map(|(_, v)| v);
        }
        self.older
            .as_mut()
            .and_then(|t| t.lookup_mut(hval, |(k, _)| k == key))
            .map(|(_, v)| v)
    }

    /// Inserts or overwrites `key`, then performs up to [`REHASH_BATCH`]
    /// steps of an in-progress migration and considers whether to start a
    /// new one.
    pub fn insert(&mut self, key: Vec<u8>, value: V) {
        self.help_rehashing();
        let hval = crate::hash::str_hash(&key);
        // Remove any existing binding first so insert behaves as upsert
        // rather than shadowing the old entry in the chain.
        self.remove_no_rehash(&key, hval);
        self.newer.insert(hval, (key, value));
        self.trigger_rehashing_if_needed();
    }

    /// Removes `key`, returning its value if present. Also advances any
    /// in-progress migration by [`REHASH_BATCH`] entries.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        self.help_rehashing();
        let hval = crate::hash::str_hash(key);
        self.remove_no_rehash(key, hval)
    }

    fn remove_no_rehash(&mut self, key: &[u8], hval: u64) -> Option<V> {
        if let Some((_, v)) = self.newer.remove(hval, |(k, _)| k == key) {
            return Some(v);
        }
        self.older
            .as_mut()
            .and_then(|t| t.remove(hval, |(k, _)| k == key))
            .map(|(_, v)| v)
    }

    fn trigger_rehashing_if_needed(&mut self) {
        if self.older.is_some() {
            return;
        }
        let load = self.newer.len() / self.newer.n_buckets();
        if load < MAX_LOAD_FACTOR {
            return;
        }
        let old_buckets = self.newer.n_buckets();
        let bigger = HashTable::new(old_buckets * 2);
        let finished = std::mem::replace(&mut self.newer, bigger);
        log::debug!(
            "triggered progressive rehash: {} buckets -> {}",
            old_buckets,
            self.newer.n_buckets()
        );
        self.older = Some(finished);
    }

    /// Moves up to [`REHASH_BATCH`] entries from the older table into the
    /// newer one. A no-op when no migration is in progress.
    fn help_rehashing(&mut self) {
        let Some(older) = self.older.as_mut() else {
            return;
        };
        for _ in 0..REHASH_BATCH {
            match older.pop_any() {
                Some((hval, entry)) => self.newer.insert(hval, entry),
                None => break,
            }
        }
        if older.is_empty() {
            self.older = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_lookup_round_trips() {
        let mut m = HashMap::new();
        m.insert(b"alice".to_vec(), 30);
        assert_eq!(m.lookup(b"alice"), Some(&30));
        assert_eq!(m.lookup(b"bob"), None);
    }

    #[test]
    fn insert_overwrites_an_existing_key() {
        let mut m = HashMap::new();
        m.insert(b"k".to_vec(), 1);
        m.insert(b"k".to_vec(), 2);
        assert_eq!(m.len(), 1);
        assert_eq!(m.lookup(b"k"), Some(&2));
    }

    #[test]
    fn remove_deletes_the_key() {
        let mut m = HashMap::new();
        m.insert(b"k".to_vec(), 1);
        assert_eq!(m.remove(b"k"), Some(1));
        assert_eq!(m.lookup(b"k"), None);
        assert_eq!(m.remove(b"k"), None);
    }

    #[test]
    fn growth_past_the_load_factor_migrates_every_key() {
        let mut m = HashMap::new();
        let n = INITIAL_SLOTS * MAX_LOAD_FACTOR * 2;
        for i in 0..n {
            m.insert(format!("key-{i}").into_bytes(), i);
        }
        assert_eq!(m.len(), n);
        for i in 0..n {
            assert_eq!(m.lookup(format!("key-{i}").as_bytes()), Some(&i));
        }
    }

    #[test]
    fn lookups_during_migration_still_see_older_table_entries() {
        let mut m = HashMap::new();
        let n = INITIAL_SLOTS * MAX_LOAD_FACTOR + 1;
        for i in 0..n {
            m.insert(format!("k{i}").into_bytes(), i);
        }
        assert!(m.older.is_some(), "expected a migration to be in progress");
        for i in 0..n {
            assert_eq!(m.lookup(format!("k{i}").as_bytes()), Some(&i));
        }
    }

    #[test]
    fn removing_many_keys_eventually_empties_the_map() {
        let mut m = HashMap::new();
        let n = 50;
        for i in 0..n {
            m.insert(format!("k{i}").into_bytes(), i);
        }
        for i in 0..n {
            m.remove(format!("k{i}").as_bytes());
        }
        assert!(m.is_empty());
    }
}
