//! Per-user like records held by the managed document store.
//!
//! The store is an external collaborator. [`RemoteLikeStore`] is the seam the
//! reconciler talks to; [`MemoryRemote`] and [`FileRemote`] are the two
//! backends shipped with the crate.

mod file;
mod memory;

pub use file::FileRemote;
pub use memory::{MemoryRemote, RemoteCall};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorCode;
use crate::quote::QuoteId;

/// Field that holds the like list inside a user record.
pub const LIKES_FIELD: &str = "likes";

/// The part of a user record the core reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Raw like sequence as stored, duplicates and order preserved.
    pub likes: Vec<QuoteId>,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    /// No record exists for the user. Only `remove_values` reports this.
    #[error("no like record for user {uid}")]
    NotFound { uid: String },
    #[error("cloud store unavailable: {0}")]
    Unavailable(String),
    #[error("cloud store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cloud record is malformed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] crate::storage::StorageError),
}

impl RemoteError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::RemoteRecordMissing,
            Self::Unavailable(_) | Self::Io(_) | Self::Storage(_) => ErrorCode::RemoteUnavailable,
            Self::Decode(_) => ErrorCode::RemoteDecodeFailed,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Document store operations on the record addressed by `uid`.
///
/// Futures are not required to be `Send`: the client runs on a single
/// cooperative thread.
#[async_trait(?Send)]
pub trait RemoteLikeStore {
    /// Read the record. `Ok(None)` when the user has no record yet.
    async fn read(&self, uid: &str) -> Result<Option<RemoteRecord>, RemoteError>;

    /// Upsert `likes`, leaving every other field of the record untouched.
    async fn merge_write(&self, uid: &str, likes: &[QuoteId]) -> Result<(), RemoteError>;

    /// Append values to an array field that are not already present,
    /// creating the record if needed.
    async fn union_append(
        &self,
        uid: &str,
        field: &str,
        values: &[QuoteId],
    ) -> Result<(), RemoteError>;

    /// Remove every occurrence of the values from an array field.
    /// Fails with [`RemoteError::NotFound`] when the record does not exist.
    async fn remove_values(
        &self,
        uid: &str,
        field: &str,
        values: &[QuoteId],
    ) -> Result<(), RemoteError>;
}

#[async_trait(?Send)]
impl<R: RemoteLikeStore + ?Sized> RemoteLikeStore for std::rc::Rc<R> {
    async fn read(&self, uid: &str) -> Result<Option<RemoteRecord>, RemoteError> {
        (**self).read(uid).await
    }

    async fn merge_write(&self, uid: &str, likes: &[QuoteId]) -> Result<(), RemoteError> {
        (**self).merge_write(uid, likes).await
    }

    async fn union_append(
        &self,
        uid: &str,
        field: &str,
        values: &[QuoteId],
    ) -> Result<(), RemoteError> {
        (**self).union_append(uid, field, values).await
    }

    async fn remove_values(
        &self,
        uid: &str,
        field: &str,
        values: &[QuoteId],
    ) -> Result<(), RemoteError> {
        (**self).remove_values(uid, field, values).await
    }
}

/// Apply an array-union to a raw JSON document, creating the field if needed.
fn union_into(doc: &mut serde_json::Map<String, serde_json::Value>, field: &str, values: &[QuoteId]) {
    let entry = doc
        .entry(field.to_string())
        .or_insert_with(|| serde_json::Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = serde_json::Value::Array(Vec::new());
    }
    if let serde_json::Value::Array(items) = entry {
        for value in values {
            let value = serde_json::Value::String(value.to_string());
            if !items.contains(&value) {
                items.push(value);
            }
        }
    }
}

/// Apply an array-remove to a raw JSON document.
fn remove_from(doc: &mut serde_json::Map<String, serde_json::Value>, field: &str, values: &[QuoteId]) {
    if let Some(serde_json::Value::Array(items)) = doc.get_mut(field) {
        items.retain(|item| {
            !values
                .iter()
                .any(|value| item.as_str() == Some(value.as_str()))
        });
    }
}

/// Extract the like list from a raw JSON document. A missing or non-array
/// field reads as empty; non-string entries are stringified.
fn likes_of(doc: &serde_json::Map<String, serde_json::Value>) -> RemoteRecord {
    let likes = match doc.get(LIKES_FIELD) {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                serde_json::Value::String(text) => QuoteId::from(text.as_str()),
                other => QuoteId::from(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    };
    RemoteRecord { likes }
}
