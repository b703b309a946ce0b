use super::{select, Document, DocumentStore, FieldFilter, OrderBy};
use crate::error::RemoteError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    failure: Option<RemoteError>,
    latency: Option<Duration>,
}

/// In-process document store.
///
/// Useful as a stand-in remote for tests and demos: failures and latency can be
/// injected to exercise the failover path.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: Mutex<Inner>,
    calls: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent call fails with `failure` until cleared with `None`.
    pub fn set_failure(&self, failure: Option<RemoteError>) {
        self.lock().failure = failure;
    }

    /// Every subsequent call sleeps this long before doing its work.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.lock().latency = latency;
    }

    /// Number of calls received, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Stores `doc` as is, bypassing id generation and failure injection.
    pub fn put(&self, collection: &str, doc: Document) {
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn enter(&self) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (failure, latency) = {
            let inner = self.lock();
            (inner.failure.clone(), inner.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, doc: Value) -> Result<String, RemoteError> {
        self.enter().await?;
        let id = Uuid::now_v7().to_string();
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document { id: id.clone(), data: doc });
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), RemoteError> {
        self.enter().await?;
        let mut inner = self.lock();
        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| RemoteError::InvalidResponse(format!("no document {}/{}", collection, id)))?;
        merge_patch(&mut doc.data, patch);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        self.enter().await?;
        if let Some(docs) = self.lock().collections.get_mut(collection) {
            docs.retain(|d| d.id != id);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        order_by: Option<OrderBy>,
    ) -> Result<Vec<Document>, RemoteError> {
        self.enter().await?;
        let docs = self.documents(collection);
        Ok(select(docs, filters, order_by.as_ref()))
    }
}

/// Shallow merge of `patch` into `target`; both are JSON objects.
pub(crate) fn merge_patch(target: &mut Value, patch: Value) {
    match (target.as_object_mut(), patch) {
        (Some(target), Value::Object(patch)) => {
            for (key, value) in patch {
                target.insert(key, value);
            }
        }
        (_, patch) => *target = patch,
    }
}
