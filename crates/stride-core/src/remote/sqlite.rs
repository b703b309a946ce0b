use super::{select, Document, DocumentStore, FieldFilter, OrderBy};
use crate::db::DbPool;
use crate::error::RemoteError;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Document store persisted as JSON rows in SQLite.
///
/// Filtering and ordering happen in memory after loading a collection; the
/// collections a single client touches are small.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: DbPool,
}

impl SqliteDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert(&self, collection: &str, doc: Value) -> Result<String, RemoteError> {
        let id = Uuid::now_v7().to_string();
        let body = serde_json::to_string(&doc)?;
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(body)
            .execute(self.pool())
            .await?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), RemoteError> {
        let patch = serde_json::to_string(&patch)?;
        let result = sqlx::query(
            "UPDATE documents SET body = json_patch(body, $1) WHERE collection = $2 AND id = $3",
        )
        .bind(patch)
        .bind(collection)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RemoteError::InvalidResponse(format!(
                "no document {}/{}",
                collection, id
            )));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        order_by: Option<OrderBy>,
    ) -> Result<Vec<Document>, RemoteError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, body FROM documents WHERE collection = $1 ORDER BY seq")
                .bind(collection)
                .fetch_all(self.pool())
                .await?;

        let docs = rows
            .into_iter()
            .map(|(id, body)| -> Result<Document, RemoteError> {
                Ok(Document { id, data: serde_json::from_str(&body)? })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(select(docs, filters, order_by.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::establish_connection;
    use serde_json::json;

    async fn setup() -> (SqliteDocumentStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("remote.db");
        let pool = establish_connection(&path.to_string_lossy())
            .await
            .expect("Failed to open test database");
        (SqliteDocumentStore::new(pool), dir)
    }

    #[tokio::test]
    async fn documents_survive_a_round_trip() {
        let (store, _dir) = setup().await;
        let first = store
            .insert("tasks", json!({"title": "one", "userId": "u", "createdAt": "2026-01-01T00:00:00Z"}))
            .await
            .unwrap();
        store
            .insert("tasks", json!({"title": "two", "userId": "u", "createdAt": "2026-01-02T00:00:00Z"}))
            .await
            .unwrap();
        store.update("tasks", &first, json!({"status": "completed"})).await.unwrap();

        let docs = store
            .query("tasks", &[FieldFilter::eq("userId", "u")], Some(OrderBy::desc("createdAt")))
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].data["title"], "two");
        assert_eq!(docs[1].data["status"], "completed");
        assert_eq!(docs[1].data["title"], "one");
    }

    #[tokio::test]
    async fn updating_a_missing_document_is_an_error() {
        let (store, _dir) = setup().await;
        let err = store.update("tasks", "nope", json!({"title": "x"})).await.unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse(_)));
    }
}
