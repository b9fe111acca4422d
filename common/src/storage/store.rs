use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::AppError,
    storage::{
        db::{sanitize_address, SurrealConnectionParams, SurrealDbClient},
        indexes::table_defines_index,
        types::content_document::ContentDocument,
    },
};

/// A content store that hands out per-request sessions.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Opens a session. Fails with `StoreUnavailable` when the store cannot be reached.
    async fn connect(&self) -> Result<Box<dyn StoreSession>, AppError>;
}

/// Read-only queries against an open store session. Every query is bounded by `take`.
///
/// `close` must run exactly once per session; hold sessions in a [`SessionGuard`].
#[async_trait]
pub trait StoreSession: Send + Sync {
    /// Approximate nearest-neighbour lookup against the named vector index.
    async fn vector_search(
        &self,
        index: &str,
        embedding: &[f32],
        take: usize,
        candidates: usize,
    ) -> Result<Vec<ContentDocument>, AppError>;

    /// Full-text search for the literal terms.
    async fn text_search(&self, terms: &str, take: usize)
        -> Result<Vec<ContentDocument>, AppError>;

    /// Case-insensitive regular expression match on the document text.
    async fn pattern_search(
        &self,
        pattern: &str,
        take: usize,
    ) -> Result<Vec<ContentDocument>, AppError>;

    /// Any documents, unfiltered.
    async fn sample(&self, take: usize) -> Result<Vec<ContentDocument>, AppError>;

    async fn close(&self);
}

/// Owns an open session and closes it exactly once.
///
/// [`SessionGuard::release`] closes in place. A guard dropped without release,
/// e.g. because the request future was cancelled, closes on a spawned task.
pub struct SessionGuard {
    session: Arc<dyn StoreSession>,
    released: bool,
}

impl SessionGuard {
    pub fn new(session: Box<dyn StoreSession>) -> Self {
        Self {
            session: Arc::from(session),
            released: false,
        }
    }

    pub fn session(&self) -> &dyn StoreSession {
        self.session.as_ref()
    }

    pub async fn release(mut self) {
        self.released = true;
        self.session.close().await;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let session = Arc::clone(&self.session);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Store session dropped before release; closing in background");
                handle.spawn(async move { session.close().await });
            }
            Err(_) => warn!("Store session dropped outside a runtime; close skipped"),
        }
    }
}

enum SessionSource {
    /// Opens a fresh authenticated connection for every session.
    Remote(SurrealConnectionParams),
    /// Reuses one client; used with the in-memory engine.
    Shared(SurrealDbClient),
}

pub struct SurrealContentStore {
    source: SessionSource,
    table: String,
}

impl SurrealContentStore {
    pub fn remote(params: SurrealConnectionParams, table: impl Into<String>) -> Self {
        Self {
            source: SessionSource::Remote(params),
            table: table.into(),
        }
    }

    pub fn shared(client: SurrealDbClient, table: impl Into<String>) -> Self {
        Self {
            source: SessionSource::Shared(client),
            table: table.into(),
        }
    }
}

#[async_trait]
impl ContentStore for SurrealContentStore {
    async fn connect(&self) -> Result<Box<dyn StoreSession>, AppError> {
        let (db, owned) = match &self.source {
            SessionSource::Remote(params) => {
                let db = SurrealDbClient::from_params(params).await.map_err(|err| {
                    AppError::StoreUnavailable(format!(
                        "connecting to {}: {err}",
                        sanitize_address(&params.address)
                    ))
                })?;
                debug!(address = %sanitize_address(&params.address), "Content store connected");
                (db, true)
            }
            SessionSource::Shared(client) => (client.clone(), false),
        };

        Ok(Box::new(SurrealSession {
            db,
            table: self.table.clone(),
            owned,
        }))
    }
}

struct SurrealSession {
    db: SurrealDbClient,
    table: String,
    owned: bool,
}

impl SurrealSession {
    async fn select(&self, sql: String, bindings: Vec<(&'static str, Value)>) -> Result<Vec<ContentDocument>, AppError> {
        let mut query = self.db.query(sql);
        for (name, value) in bindings {
            query = query.bind((name, value));
        }
        let mut response = query.await?;
        let documents: Vec<ContentDocument> = response.take(0)?;
        Ok(documents)
    }

    async fn ensure_vector_index(&self, index: &str) -> Result<(), AppError> {
        let mut response = self
            .db
            .query(format!("INFO FOR TABLE {};", self.table))
            .await?;
        let info: surrealdb::Value = response.take(0)?;
        let info_json = serde_json::to_value(info)
            .map_err(|err| AppError::InternalError(format!("reading table info: {err}")))?;

        if table_defines_index(&info_json, index) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "vector index '{index}' is not defined on table '{}'",
                self.table
            )))
        }
    }
}

fn limit_value(take: usize) -> Value {
    Value::from(i64::try_from(take).unwrap_or(i64::MAX))
}

#[async_trait]
impl StoreSession for SurrealSession {
    async fn vector_search(
        &self,
        index: &str,
        embedding: &[f32],
        take: usize,
        candidates: usize,
    ) -> Result<Vec<ContentDocument>, AppError> {
        self.ensure_vector_index(index).await?;

        let sql = format!(
            "SELECT *, vector::distance::knn() AS distance FROM {table} \
             WHERE embedding <|{take},{candidates}|> $embedding \
             ORDER BY distance LIMIT $limit",
            table = self.table,
        );
        self.select(
            sql,
            vec![
                ("embedding", Value::from(embedding.to_vec())),
                ("limit", limit_value(take)),
            ],
        )
        .await
    }

    async fn text_search(
        &self,
        terms: &str,
        take: usize,
    ) -> Result<Vec<ContentDocument>, AppError> {
        let sql = format!(
            "SELECT * FROM {table} WHERE text @@ $terms LIMIT $limit",
            table = self.table
        );
        self.select(
            sql,
            vec![("terms", Value::from(terms)), ("limit", limit_value(take))],
        )
        .await
    }

    async fn pattern_search(
        &self,
        pattern: &str,
        take: usize,
    ) -> Result<Vec<ContentDocument>, AppError> {
        let sql = format!(
            "SELECT * FROM {table} WHERE string::matches(text, $pattern) LIMIT $limit",
            table = self.table
        );
        self.select(
            sql,
            vec![
                ("pattern", Value::from(format!("(?i){pattern}"))),
                ("limit", limit_value(take)),
            ],
        )
        .await
    }

    async fn sample(&self, take: usize) -> Result<Vec<ContentDocument>, AppError> {
        let sql = format!("SELECT * FROM {table} LIMIT $limit", table = self.table);
        self.select(sql, vec![("limit", limit_value(take))]).await
    }

    async fn close(&self) {
        if !self.owned {
            return;
        }
        if let Err(err) = self.db.invalidate().await {
            warn!(error = %err, "Failed to invalidate content store session");
        }
        debug!("Content store session closed");
    }
}
