use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::{RemoteError, RemoteLikeStore, RemoteRecord, likes_of, remove_from, union_into};
use crate::lock::{DEFAULT_LOCK_TIMEOUT, WriteLock};
use crate::quote::QuoteId;
use crate::storage::{StorageError, replace_locked};

/// Document store kept in a directory: one `<uid>.json` object per user.
///
/// Stands in for the managed backend when running the CLI offline. Each
/// update reads and replaces its document while holding the same advisory
/// lock local slots use.
#[derive(Debug, Clone)]
pub struct FileRemote {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl FileRemote {
    /// Store rooted at `<data_dir>/<collection>`.
    #[must_use]
    pub fn new(data_dir: &Path, collection: &str) -> Self {
        Self {
            dir: data_dir.join(collection),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `uid`. Characters outside `[A-Za-z0-9_-]`
    /// are hex-escaped so a uid can never leave the collection directory.
    #[must_use]
    pub fn document_path(&self, uid: &str) -> PathBuf {
        let mut name = String::with_capacity(uid.len() + 5);
        for byte in uid.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                name.push(char::from(byte));
            } else {
                let _ = write!(name, "%{byte:02X}");
            }
        }
        name.push_str(".json");
        self.dir.join(name)
    }

    fn load(&self, uid: &str) -> Result<Option<Map<String, Value>>, RemoteError> {
        let path = self.document_path(uid);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(doc) => Ok(Some(doc)),
            other => {
                debug!(uid, kind = ?other, "like record is not an object, treating as empty");
                Ok(Some(Map::new()))
            }
        }
    }

    /// Load, change, and store the document for `uid` under its write lock.
    fn modify(
        &self,
        uid: &str,
        change: impl FnOnce(Option<Map<String, Value>>) -> Result<Map<String, Value>, RemoteError>,
    ) -> Result<(), RemoteError> {
        let path = self.document_path(uid);
        let lock = WriteLock::for_file(&path, self.lock_timeout).map_err(StorageError::from)?;
        let doc = change(self.load(uid)?)?;
        let content = serde_json::to_string_pretty(&doc)?;
        replace_locked(&path, &content)?;
        lock.release();
        Ok(())
    }
}

#[async_trait(?Send)]
impl RemoteLikeStore for FileRemote {
    async fn read(&self, uid: &str) -> Result<Option<RemoteRecord>, RemoteError> {
        Ok(self.load(uid)?.as_ref().map(likes_of))
    }

    async fn merge_write(&self, uid: &str, likes: &[QuoteId]) -> Result<(), RemoteError> {
        self.modify(uid, |doc| {
            let mut doc = doc.unwrap_or_default();
            let items = likes
                .iter()
                .map(|id| Value::String(id.to_string()))
                .collect();
            doc.insert(super::LIKES_FIELD.to_string(), Value::Array(items));
            Ok(doc)
        })
    }

    async fn union_append(
        &self,
        uid: &str,
        field: &str,
        values: &[QuoteId],
    ) -> Result<(), RemoteError> {
        self.modify(uid, |doc| {
            let mut doc = doc.unwrap_or_default();
            union_into(&mut doc, field, values);
            Ok(doc)
        })
    }

    async fn remove_values(
        &self,
        uid: &str,
        field: &str,
        values: &[QuoteId],
    ) -> Result<(), RemoteError> {
        self.modify(uid, |doc| {
            let Some(mut doc) = doc else {
                return Err(RemoteError::NotFound {
                    uid: uid.to_string(),
                });
            };
            remove_from(&mut doc, field, values);
            Ok(doc)
        })
    }
}
