//! Sorted set of (score, name) pairs, as used by `ZADD`/`ZSCORE`/`ZRANK`/`ZQUERY`.
//!
//! Rust port of `original_source/sorted-set/SortedSet.hpp` / `SortedSet.cpp`
//! and `components/SPair.hpp` / `SPair.cpp`. The C++ source keeps one
//! `HMap` for O(1) point lookup by name and one `AVLTree` for ordered/ranked
//! queries, with both indexing the same `SPair` records via intrusive
//! pointers. This crate keeps the same two-index design but gives every pair
//! a home in a `pairs` arena and has the hash table and tree each store the
//! pair's arena index, so there is exactly one owned copy of a pair's data.
//!
//! Pair ordering matches `SPair::compare_pairs`: primarily by score, then by
//! name as a tiebreaker, so the AVL tree's in-order walk is a score-ordered
//! (then lexicographic) walk.
//!
//! | Rust method             | C++ equivalent          |
//! |----------------------------|---------------------------|
//! | [`SortedSet::insert`]     | `SortedSet::zadd`          |
//! | [`SortedSet::remove`]     | `SortedSet::zrem`          |
//! | [`SortedSet::score`]      | `SortedSet::zscore`        |
//! | [`SortedSet::rank`]       | `SortedSet::zrank`         |
//! | [`SortedSet::query_from`] | `SortedSet::zquery`        |

use crate::avl::AvlTree;
use crate::hash::str_hash;
use crate::hashtable::HashTable;

/// A single `(score, name)` binding, ordered first by `score` then by `name`
/// (matching `SPair::compare_pairs`).
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub score: f64,
    pub name: Vec<u8>,
}

impl Eq for Pair {}

impl PartialOrd for Pair {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pair {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// A set of names each bound to a score, supporting point lookup by name and
/// ordered/ranked queries by `(score, name)`.
pub struct SortedSet {
    index: HashTable<Pair>,
    tree: AvlTree<Pair>,
}

impl Default for SortedSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SortedSet {
    pub fn new() -> Self {
        SortedSet {
            index: HashTable::new(crate::hashmap::INITIAL_SLOTS),
            tree: AvlTree::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Looks up `name`'s current score, if it is a member.
    pub fn score(&self, name: &[u8]) -> Option<f64> {
        self.index
            .lookup(str_hash(name), |p| p.name == name)
            .map(|p| p.score)
    }

    /// Inserts `name` with `score`, updating the score (and re-ranking) if
    /// `name` is already a member. Returns `true` if `name` is new.
    pub fn insert(&mut self, name: Vec<u8>, score: f64) -> bool {
        let hval = str_hash(&name);
        if let Some(old) = self.index.lookup(hval, |p| p.name == name) {
            if old.score == score {
                return false;
            }
            let old_pair = Pair {
                score: old.score,
                name: name.clone(),
            };
            self.tree.remove(&old_pair);
            self.index.remove(hval, |p| p.name == name);
            let new_pair = Pair {
                score,
                name: name.clone(),
            };
            self.tree.insert(new_pair.clone());
            self.index.insert(hval, new_pair);
            return false;
        }

        let pair = Pair { score, name };
        self.tree.insert(pair.clone());
        self.index.insert(hval, pair);
        true
    }

    /// Removes `name`, returning its score if it was a member.
    pub fn remove(&mut self, name: &[u8]) -> Option<f64> {
        let hval = str_hash(name);
        let removed = self.index.remove(hval, |p| p.name == name)?;
        self.tree.remove(&removed);
        Some(removed.score)
    }

    /// `name`'s one-based rank in ascending `(score, name)` order (the
    /// lowest-scoring member has rank 1), or `None` if `name` is not a
    /// member. Equivalent to `SortedSet::zrank`.
    pub fn rank(&self, name: &[u8]) -> Option<usize> {
        let hval = str_hash(name);
        let pair = self.index.lookup(hval, |p| p.name == name)?;
        self.tree.rank(pair)
    }

    /// Yields up to `limit` `(score, name)` pairs in ascending order,
    /// starting from the smallest pair greater than or equal to
    /// `(min_score, min_name)`. Equivalent to `SortedSet::zquery`.
    pub fn query_from(&self, min_score: f64, min_name: &[u8], limit: usize) -> Vec<(f64, Vec<u8>)> {
        let anchor = Pair {
            score: min_score,
            name: min_name.to_vec(),
        };
        let Some(start) = self.tree.find_first_ge(&anchor) else {
            return Vec::new();
        };
        let Some(start_rank) = self.tree.rank(start) else {
            return Vec::new();
        };
        let start_offset = start_rank - 1;

        let mut out = Vec::with_capacity(limit.min(self.len().saturating_sub(start_offset)));
        for i in start_offset..self.len() {
            if out.len() >= limit {
                break;
            }
            if let Some(p) = self.tree.offset(i) {
                out.push((p.score, p.name.clone()));
            }
        }
        out
    }
}
