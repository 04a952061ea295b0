use tracing::{debug, warn};

use crate::likes::set::LikeSet;
use crate::quote::QuoteId;
use crate::storage::{KeyValueSlot, StorageError};

/// Device-local like set persisted in a single slot as a JSON array of strings.
///
/// Reads never fail: missing, unreadable, or malformed content is an empty
/// set. Every mutation is one complete replace of the slot.
#[derive(Debug)]
pub struct LocalLikeStore<S> {
    slot: S,
}

impl<S: KeyValueSlot> LocalLikeStore<S> {
    pub const fn new(slot: S) -> Self {
        Self { slot }
    }

    pub const fn slot(&self) -> &S {
        &self.slot
    }

    /// Current persisted set, empty on any read or decode failure.
    pub fn get(&self) -> LikeSet {
        match self.slot.read() {
            Ok(raw) => decode(raw.as_deref()),
            Err(err) => {
                warn!(error = %err, "local likes unreadable, treating as empty");
                LikeSet::new()
            }
        }
    }

    /// Replace the persisted set.
    pub fn set(&self, ids: &LikeSet) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(ids)?;
        self.slot.write(&encoded)
    }

    #[must_use]
    pub fn is_liked(&self, id: &QuoteId) -> bool {
        self.get().contains(id)
    }

    /// Add one like. The read and the replace happen under one slot
    /// update, so concurrent writers cannot drop each other's changes.
    pub fn add(&self, id: &QuoteId) -> Result<(), StorageError> {
        self.modify(|likes| {
            likes.insert(id.clone());
        })
    }

    pub fn remove(&self, id: &QuoteId) -> Result<(), StorageError> {
        self.modify(|likes| {
            likes.remove(id);
        })
    }

    fn modify(&self, mut change: impl FnMut(&mut LikeSet)) -> Result<(), StorageError> {
        self.slot.update(&mut |raw: Option<String>| {
            let mut likes = decode(raw.as_deref());
            change(&mut likes);
            Ok(serde_json::to_string(&likes)?)
        })
    }
}

fn decode(raw: Option<&str>) -> LikeSet {
    let Some(raw) = raw else {
        return LikeSet::new();
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(ids) => LikeSet::from_ids(ids),
        Err(err) => {
            debug!(error = %err, "local likes malformed, treating as empty");
            LikeSet::new()
        }
    }
}
