use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{RemoteError, RemoteLikeStore, RemoteRecord, likes_of, remove_from, union_into};
use crate::quote::QuoteId;

/// One operation observed by [`MemoryRemote`], successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Read { uid: String },
    MergeWrite { uid: String, likes: Vec<QuoteId> },
    UnionAppend { uid: String, values: Vec<QuoteId> },
    RemoveValues { uid: String, values: Vec<QuoteId> },
}

impl RemoteCall {
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::Read { .. })
    }
}

/// In-memory document store with fault injection.
///
/// Each operation suspends once before touching state, so concurrently
/// polled futures interleave the way network calls would.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    docs: RefCell<BTreeMap<String, Map<String, Value>>>,
    calls: RefCell<Vec<RemoteCall>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl MemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user record with a raw like sequence.
    pub fn seed<I, T>(&self, uid: &str, likes: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<QuoteId>,
    {
        let items = likes
            .into_iter()
            .map(|id| Value::String(id.into().to_string()))
            .collect();
        let mut doc = Map::new();
        doc.insert(super::LIKES_FIELD.to_string(), Value::Array(items));
        self.docs.borrow_mut().insert(uid.to_string(), doc);
    }

    /// Seed a user record with an arbitrary document.
    pub fn seed_document(&self, uid: &str, doc: Map<String, Value>) {
        self.docs.borrow_mut().insert(uid.to_string(), doc);
    }

    /// Raw document for a user, if any.
    #[must_use]
    pub fn document(&self, uid: &str) -> Option<Map<String, Value>> {
        self.docs.borrow().get(uid).cloned()
    }

    /// Stored like sequence, `None` when the user has no record.
    #[must_use]
    pub fn likes(&self, uid: &str) -> Option<Vec<QuoteId>> {
        self.docs.borrow().get(uid).map(|doc| likes_of(doc).likes)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.borrow().clone()
    }

    #[must_use]
    pub fn mutations(&self) -> Vec<RemoteCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: RemoteCall) {
        self.calls.borrow_mut().push(call);
    }

    fn check_writable(&self) -> Result<(), RemoteError> {
        if self.fail_writes.get() {
            return Err(RemoteError::Unavailable("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl RemoteLikeStore for MemoryRemote {
    async fn read(&self, uid: &str) -> Result<Option<RemoteRecord>, RemoteError> {
        YieldOnce::default().await;
        self.record(RemoteCall::Read {
            uid: uid.to_string(),
        });
        if self.fail_reads.get() {
            return Err(RemoteError::Unavailable("injected read failure".to_string()));
        }
        Ok(self.docs.borrow().get(uid).map(likes_of))
    }

    async fn merge_write(&self, uid: &str, likes: &[QuoteId]) -> Result<(), RemoteError> {
        YieldOnce::default().await;
        self.record(RemoteCall::MergeWrite {
            uid: uid.to_string(),
            likes: likes.to_vec(),
        });
        self.check_writable()?;
        let items = likes
            .iter()
            .map(|id| Value::String(id.to_string()))
            .collect();
        self.docs
            .borrow_mut()
            .entry(uid.to_string())
            .or_default()
            .insert(super::LIKES_FIELD.to_string(), Value::Array(items));
        Ok(())
    }

    async fn union_append(
        &self,
        uid: &str,
        field: &str,
        values: &[QuoteId],
    ) -> Result<(), RemoteError> {
        YieldOnce::default().await;
        self.record(RemoteCall::UnionAppend {
            uid: uid.to_string(),
            values: values.to_vec(),
        });
        self.check_writable()?;
        let mut docs = self.docs.borrow_mut();
        union_into(docs.entry(uid.to_string()).or_default(), field, values);
        Ok(())
    }

    async fn remove_values(
        &self,
        uid: &str,
        field: &str,
        values: &[QuoteId],
    ) -> Result<(), RemoteError> {
        YieldOnce::default().await;
        self.record(RemoteCall::RemoveValues {
            uid: uid.to_string(),
            values: values.to_vec(),
        });
        self.check_writable()?;
        let mut docs = self.docs.borrow_mut();
        let Some(doc) = docs.get_mut(uid) else {
            return Err(RemoteError::NotFound {
                uid: uid.to_string(),
            });
        };
        remove_from(doc, field, values);
        Ok(())
    }
}

/// Future that returns `Pending` exactly once, waking itself immediately.
#[derive(Debug, Default)]
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn ids(values: &[&str]) -> Vec<QuoteId> {
        values.iter().copied().map(QuoteId::from).collect()
    }

    #[test]
    fn missing_record_reads_none() {
        let remote = MemoryRemote::new();
        assert_eq!(block_on(remote.read("u1")).expect("read"), None);
    }

    #[test]
    fn merge_write_keeps_other_fields() {
        let remote = MemoryRemote::new();
        let mut doc = Map::new();
        doc.insert("theme".to_string(), Value::String("dark".to_string()));
        remote.seed_document("u1", doc);

        block_on(remote.merge_write("u1", &ids(&["1", "2"]))).expect("write");

        let stored = remote.document("u1").expect("record exists");
        assert_eq!(stored["theme"], Value::String("dark".to_string()));
        assert_eq!(remote.likes("u1"), Some(ids(&["1", "2"])));
    }

    #[test]
    fn union_append_creates_record() {
        let remote = MemoryRemote::new();
        block_on(remote.union_append("u1", "likes", &ids(&["5"]))).expect("append");
        block_on(remote.union_append("u1", "likes", &ids(&["5"]))).expect("append again");
        assert_eq!(remote.likes("u1"), Some(ids(&["5"])));
    }

    #[test]
    fn remove_without_record_is_not_found() {
        let remote = MemoryRemote::new();
        let err = block_on(remote.remove_values("u1", "likes", &ids(&["5"])))
            .expect_err("no record");
        assert!(err.is_not_found());
        assert_eq!(remote.likes("u1"), None);
    }

    #[test]
    fn injected_failures_are_unavailable() {
        let remote = MemoryRemote::new();
        remote.set_fail_reads(true);
        remote.set_fail_writes(true);

        assert!(!block_on(remote.read("u1")).expect_err("read fails").is_not_found());
        assert!(block_on(remote.merge_write("u1", &ids(&["1"]))).is_err());
        assert_eq!(remote.likes("u1"), None);
        assert_eq!(remote.calls().len(), 2);
        assert_eq!(remote.mutations().len(), 1);
    }
}
