//! Keyed enter/update/exit reconciliation.
//!
//! Renderers keep the last frame's data indexed by key and diff it against the next frame to
//! decide which visual elements to create, move, or remove. Identity is purely the data key;
//! nothing here knows about the elements themselves.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};

use crate::error::{Error, Result};

/// The three partitions produced by [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationResult<T> {
    /// Elements of `next` whose key was absent from `previous`, in `next` order.
    pub entering: Vec<T>,
    /// `(old, new)` pairs for keys present on both sides, in `next` order.
    pub updating: Vec<(T, T)>,
    /// Elements of `previous` whose key is absent from `next`, in `previous` order.
    pub exiting: Vec<T>,
}

impl<T> Default for ReconciliationResult<T> {
    fn default() -> Self {
        Self {
            entering: Vec::new(),
            updating: Vec::new(),
            exiting: Vec::new(),
        }
    }
}

impl<T> ReconciliationResult<T> {
    /// True when nothing entered or exited.
    pub fn is_unchanged(&self) -> bool {
        self.entering.is_empty() && self.exiting.is_empty()
    }

    /// Total number of keys across all three partitions.
    pub fn len(&self) -> usize {
        self.entering.len() + self.updating.len() + self.exiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entering_keys<K>(&self, key_of: impl Fn(&T) -> K) -> Vec<K> {
        self.entering.iter().map(key_of).collect()
    }

    pub fn exiting_keys<K>(&self, key_of: impl Fn(&T) -> K) -> Vec<K> {
        self.exiting.iter().map(key_of).collect()
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> ReconciliationResult<U> {
        ReconciliationResult {
            entering: self.entering.into_iter().map(&mut f).collect(),
            updating: self
                .updating
                .into_iter()
                .map(|(old, new)| (f(old), f(new)))
                .collect(),
            exiting: self.exiting.into_iter().map(&mut f).collect(),
        }
    }
}

/// Diffs `previous` against `next` by key.
///
/// Runs in O(n) over a hash index of `next`'s keys. Inputs are borrowed and never mutated, so
/// the same pair always yields the same partition. Fails with [`Error::DuplicateKey`] when two
/// elements of `next` share a key.
pub fn reconcile<K, T, S, F>(
    previous: &IndexMap<K, T, S>,
    next: &[T],
    key_of: F,
) -> Result<ReconciliationResult<T>>
where
    K: Eq + Hash + fmt::Display,
    T: Clone,
    S: BuildHasher,
    F: Fn(&T) -> K,
{
    let mut seen: FxHashSet<K> = FxHashSet::default();
    seen.reserve(next.len());

    let mut out = ReconciliationResult::default();
    for item in next {
        let key = key_of(item);
        match previous.get(&key) {
            Some(old) => out.updating.push((old.clone(), item.clone())),
            None => out.entering.push(item.clone()),
        }
        if let Some(dup) = seen.replace(key) {
            return Err(Error::DuplicateKey {
                key: dup.to_string(),
            });
        }
    }

    out.exiting = previous
        .iter()
        .filter(|(k, _)| !seen.contains(*k))
        .map(|(_, v)| v.clone())
        .collect();

    Ok(out)
}

/// Indexes `items` by key, preserving their order. This is the shape [`reconcile`] expects for
/// the previous frame.
pub fn index_by_key<K, T, F>(
    items: impl IntoIterator<Item = T>,
    key_of: F,
) -> Result<IndexMap<K, T, FxBuildHasher>>
where
    K: Eq + Hash + fmt::Display,
    F: Fn(&T) -> K,
{
    let items = items.into_iter();
    let mut out: IndexMap<K, T, FxBuildHasher> =
        IndexMap::with_capacity_and_hasher(items.size_hint().0, FxBuildHasher);
    for item in items {
        let key = key_of(&item);
        if out.contains_key(&key) {
            return Err(Error::DuplicateKey {
                key: key.to_string(),
            });
        }
        out.insert(key, item);
    }
    Ok(out)
}
