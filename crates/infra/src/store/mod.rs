//! Record store.
//!
//! The store is reachable only through a query/transaction API: callers open
//! a [`Transaction`] from a [`Database`], read and write JSON records keyed by
//! `(kind, id)`, then commit or roll back. Two backends implement it:
//! Postgres (`sqlx`) and an in-memory store for development and tests.
//!
//! Higher layers normally go through [`run_in_transaction`] (retries transient
//! conflicts) and the typed helpers in [`repo`].

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repo;
pub mod retry;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use teatrade_core::{Page, PageRequest};

use crate::config::DatabaseSettings;

pub use error::{ErrorClass, StoreError, classify};
pub use memory::{FaultPoint, InMemoryDatabase};
pub use postgres::PostgresDatabase;
pub use retry::{RetryPolicy, Retryable, run_in_transaction};

/// A record as the store sees it: opaque JSON plus identity and natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: Uuid,
    pub unique_key: Option<String>,
    pub data: Value,
}

/// Exact-match filter on top-level JSON fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Map<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `data` contains every filtered field with an equal value.
    pub fn matches(&self, data: &Value) -> bool {
        self.0.iter().all(|(k, v)| data.get(k) == Some(v))
    }

    /// The filter as a JSON object, for `jsonb @>` containment.
    pub fn as_json(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Entry point to a store.
#[async_trait]
pub trait Database: Send + Sync {
    /// Open a new transaction.
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError>;

    /// Release connections. Called once at shutdown.
    async fn close(&self) {}
}

/// One unit of work against the store.
///
/// Dropping an unfinished transaction rolls it back.
#[async_trait]
pub trait Transaction: Send {
    /// Insert a new record. Fails with `23505` if the unique key is taken.
    async fn insert(&mut self, kind: &str, record: RawRecord) -> Result<(), StoreError>;

    /// Replace an existing record. [`StoreError::NotFound`] if it does not exist.
    async fn update(&mut self, kind: &str, record: RawRecord) -> Result<(), StoreError>;

    /// Delete a record. [`StoreError::NotFound`] if it does not exist.
    async fn delete(&mut self, kind: &str, id: Uuid) -> Result<(), StoreError>;

    async fn get(&mut self, kind: &str, id: Uuid) -> Result<Option<Value>, StoreError>;

    /// Newest first.
    async fn list(&mut self, kind: &str, filter: &Filter, page: PageRequest) -> Result<Page<Value>, StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;
}

/// Build the configured store: `memory://` selects the in-memory backend,
/// anything else is treated as a Postgres URL.
pub async fn connect(settings: &DatabaseSettings) -> Result<Arc<dyn Database>, StoreError> {
    if settings.url.starts_with("memory://") {
        tracing::warn!("using in-memory store; data is lost on restart");
        return Ok(Arc::new(InMemoryDatabase::new()));
    }

    let db = PostgresDatabase::connect(settings).await?;
    if settings.run_migrations {
        db.migrate().await?;
    }
    Ok(Arc::new(db))
}
