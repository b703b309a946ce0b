//! Remote document store boundary.
//!
//! The core talks to its authoritative store only through [`DocumentStore`].
//! [`RemoteLink`] wraps a store with the bounded wait and the one-way switch
//! to local-only mode shared by every store of a session.

use crate::diagnostics::{Diagnostics, NonFatal};
use crate::error::RemoteError;
use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Marker reserved for ids generated while the remote is unreachable.
pub const LOCAL_ID_MARKER: &str = "local-";

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_MARKER)
}

/// A stored document: store-assigned id plus a JSON object body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, data: &Value) -> bool {
        data.get(&self.field) == Some(&self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }
}

/// Filters and sorts documents in memory. Shared by the bundled adapters.
pub(crate) fn select(
    mut docs: Vec<Document>,
    filters: &[FieldFilter],
    order_by: Option<&OrderBy>,
) -> Vec<Document> {
    docs.retain(|doc| filters.iter().all(|f| f.matches(&doc.data)));
    if let Some(order) = order_by {
        docs.sort_by(|a, b| {
            let ordering = compare_values(a.data.get(&order.field), b.data.get(&order.field));
            match order.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
    }
    docs
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Authoritative remote store. Any call may fail; the core treats every
/// failure as "remote unavailable".
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: &str, doc: Value) -> Result<String, RemoteError>;
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), RemoteError>;
    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError>;
    async fn query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        order_by: Option<OrderBy>,
    ) -> Result<Vec<Document>, RemoteError>;
}

/// Replaces the first document matching `filters` with `body`, or inserts it.
pub(crate) async fn upsert(
    store: Arc<dyn DocumentStore>,
    collection: &'static str,
    filters: Vec<FieldFilter>,
    body: Value,
) -> Result<(), RemoteError> {
    let existing = store.query(collection, &filters, None).await?;
    match existing.first() {
        Some(doc) => store.update(collection, &doc.id, body).await,
        None => store.insert(collection, body).await.map(|_| ()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Remote,
    LocalFallback,
}

/// One-way Remote -> LocalFallback switch.
#[derive(Debug, Default)]
pub struct ModeSwitch {
    fallen_back: AtomicBool,
}

impl ModeSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts already in local-only mode.
    pub fn local_only() -> Self {
        Self {
            fallen_back: AtomicBool::new(true),
        }
    }

    pub fn mode(&self) -> StoreMode {
        if self.fallen_back.load(Ordering::Acquire) {
            StoreMode::LocalFallback
        } else {
            StoreMode::Remote
        }
    }

    /// Returns true only for the call that performed the transition.
    pub fn fall_back(&self) -> bool {
        !self.fallen_back.swap(true, Ordering::AcqRel)
    }
}

/// Races a remote operation against `deadline`.
///
/// The operation runs as its own task, so expiry does not cancel an in-flight
/// write; a late result is simply discarded.
pub async fn with_deadline<T, Fut>(deadline: Duration, op: Fut) -> Result<T, RemoteError>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
{
    let handle = tokio::spawn(op);
    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(RemoteError::Network(format!(
            "remote operation aborted: {}",
            join_err
        ))),
        Err(_) => Err(RemoteError::Timeout(deadline)),
    }
}

/// A document store plus the session's failover state.
#[derive(Clone)]
pub struct RemoteLink {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
    mode: Arc<ModeSwitch>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl RemoteLink {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        timeout: Duration,
        mode: Arc<ModeSwitch>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            store,
            timeout,
            mode,
            diagnostics,
        }
    }

    pub fn mode(&self) -> StoreMode {
        self.mode.mode()
    }

    pub fn is_remote(&self) -> bool {
        self.mode() == StoreMode::Remote
    }

    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        &self.diagnostics
    }

    /// Runs `op` against the store when still in remote mode.
    ///
    /// `Ok(None)` means the session is local-only and nothing was attempted.
    /// Any failure flips the session to local-only mode before returning.
    pub async fn call<T, F, Fut>(
        &self,
        operation: &'static str,
        op: F,
    ) -> Result<Option<T>, RemoteError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn DocumentStore>) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        if !self.is_remote() {
            return Ok(None);
        }
        tracing::debug!(operation, "remote call");
        match with_deadline(self.timeout, op(Arc::clone(&self.store))).await {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                self.fall_back(operation, &err);
                Err(err)
            }
        }
    }

    fn fall_back(&self, operation: &'static str, err: &RemoteError) {
        if self.mode.fall_back() {
            tracing::info!(operation, error = %err, "remote store unavailable, switching to local mode");
            self.diagnostics.report(NonFatal::RemoteFallback {
                operation,
                source: err.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use serde_json::json;

    #[test]
    fn mode_switch_is_one_way() {
        let switch = ModeSwitch::new();
        assert_eq!(switch.mode(), StoreMode::Remote);
        assert!(switch.fall_back());
        assert!(!switch.fall_back());
        assert_eq!(switch.mode(), StoreMode::LocalFallback);
    }

    #[test]
    fn timestamps_order_by_instant_not_text() {
        let docs = vec![
            Document { id: "half".into(), data: json!({"createdAt": "2026-01-01T00:00:00.5Z"}) },
            Document { id: "whole".into(), data: json!({"createdAt": "2026-01-01T00:00:00Z"}) },
            Document { id: "later".into(), data: json!({"createdAt": "2026-01-01T01:00:00+02:00"}) },
            Document { id: "next".into(), data: json!({"createdAt": "2026-01-01T00:00:01Z"}) },
        ];
        let ids: Vec<_> = select(docs, &[], Some(&OrderBy::asc("createdAt")))
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["later", "whole", "half", "next"]);
    }

    #[test]
    fn select_filters_and_orders() {
        let docs = vec![
            Document { id: "a".into(), data: json!({"userId": "u1", "createdAt": "2026-01-01T00:00:00Z"}) },
            Document { id: "b".into(), data: json!({"userId": "u2", "createdAt": "2026-01-02T00:00:00Z"}) },
            Document { id: "c".into(), data: json!({"userId": "u1", "createdAt": "2026-01-03T00:00:00Z"}) },
        ];
        let picked = select(docs, &[FieldFilter::eq("userId", "u1")], Some(&OrderBy::desc("createdAt")));
        let ids: Vec<_> = picked.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn deadline_expiry_reports_timeout() {
        let result: Result<(), _> = with_deadline(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(RemoteError::Timeout(Duration::from_millis(20))));
    }

    #[tokio::test]
    async fn failed_call_flips_mode_once_and_skips_later_calls() {
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let link = RemoteLink::new(
            Arc::new(MemoryDocumentStore::new()),
            DEFAULT_REMOTE_TIMEOUT,
            Arc::new(ModeSwitch::new()),
            diagnostics.clone(),
        );

        let failed: Result<Option<()>, _> = link
            .call("insert", |_| async { Err(RemoteError::Network("offline".into())) })
            .await;
        assert!(failed.is_err());
        assert_eq!(link.mode(), StoreMode::LocalFallback);

        let skipped = link
            .call("insert", |_| async { Ok(42) })
            .await
            .unwrap();
        assert_eq!(skipped, None);
        assert_eq!(link.mode(), StoreMode::LocalFallback);
        assert_eq!(diagnostics.count(), 1);
    }
}
