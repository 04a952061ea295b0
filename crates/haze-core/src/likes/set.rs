use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::quote::QuoteId;

/// Join of two replicas of the same state.
pub trait Merge {
    fn merge(&mut self, other: Self);
}

/// Deduplicated set of liked quote identifiers.
///
/// Merging is a plain set union, so it satisfies the semilattice laws:
/// - Commutative: a ∪ b = b ∪ a
/// - Associative: (a ∪ b) ∪ c = a ∪ (b ∪ c)
/// - Idempotent: a ∪ a = a
///
/// There is no per-id provenance: a like removed on one device comes back
/// when a stale replica that still holds it is merged in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LikeSet {
    ids: BTreeSet<QuoteId>,
}

impl LikeSet {
    /// Create a new empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ids: BTreeSet::new(),
        }
    }

    /// Build a set from anything convertible to [`QuoteId`], dropping duplicates.
    pub fn from_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<QuoteId>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Insert an id. Returns `false` if it was already present.
    pub fn insert(&mut self, id: QuoteId) -> bool {
        self.ids.insert(id)
    }

    /// Remove an id. Returns `false` if it was not present.
    pub fn remove(&mut self, id: &QuoteId) -> bool {
        self.ids.remove(id)
    }

    #[must_use]
    pub fn contains(&self, id: &QuoteId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuoteId> {
        self.ids.iter()
    }

    /// Sorted sequence, the stable on-disk representation.
    #[must_use]
    pub fn to_sorted_vec(&self) -> Vec<QuoteId> {
        self.ids.iter().cloned().collect()
    }

    /// Union of both sets, leaving the inputs untouched.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            ids: self.ids.union(&other.ids).cloned().collect(),
        }
    }
}

impl Merge for LikeSet {
    fn merge(&mut self, other: Self) {
        self.ids.extend(other.ids);
    }
}

impl FromIterator<QuoteId> for LikeSet {
    fn from_iter<I: IntoIterator<Item = QuoteId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for LikeSet {
    type Item = QuoteId;
    type IntoIter = std::collections::btree_set::IntoIter<QuoteId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

/// Whether the merged set has to be written back to the remote record.
///
/// `remote` is the record's raw sequence (it may carry duplicates or be in
/// any order). Write-back happens when forced, or when the sorted remote
/// sequence differs from the sorted merged set in length or at any position.
#[must_use]
pub fn needs_write_back(remote: &[QuoteId], merged: &LikeSet, force_refresh: bool) -> bool {
    if force_refresh {
        return true;
    }
    let mut remote_sorted = remote.to_vec();
    remote_sorted.sort();
    remote_sorted.len() != merged.len()
        || remote_sorted.iter().zip(merged.iter()).any(|(a, b)| a != b)
}
