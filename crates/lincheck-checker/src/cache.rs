//! Visited-state cache for the linearization search.
//!
//! Two different orderings that commit the same set of operations and leave
//! the model in equal states have identical futures, so only the first one
//! needs exploring. Only the frontier is hashed: state equality comes from
//! the model and need not agree with any hash of the state.

use std::collections::HashMap;

use crate::bitset::Bitset;

#[derive(Debug)]
struct CacheEntry<S> {
    linearized: Bitset,
    state: S,
}

/// Set of `(frontier, state)` pairs reached so far in one search.
///
/// Entries are only ever added.
#[derive(Debug)]
pub(crate) struct VisitedCache<S> {
    buckets: HashMap<u64, Vec<CacheEntry<S>>>,
    len: usize,
}

impl<S> VisitedCache<S> {
    pub(crate) fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            len: 0,
        }
    }

    /// Returns true if an entry with an identical frontier and a state equal
    /// under `equal` has been inserted.
    pub(crate) fn contains(
        &self,
        linearized: &Bitset,
        state: &S,
        equal: impl Fn(&S, &S) -> bool,
    ) -> bool {
        self.buckets
            .get(&linearized.hash_key())
            .is_some_and(|bucket| {
                bucket
                    .iter()
                    .any(|e| e.linearized == *linearized && equal(&e.state, state))
            })
    }

    pub(crate) fn insert(&mut self, linearized: Bitset, state: S) {
        self.buckets
            .entry(linearized.hash_key())
            .or_default()
            .push(CacheEntry { linearized, state });
        self.len += 1;
    }

    /// Number of entries recorded.
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
