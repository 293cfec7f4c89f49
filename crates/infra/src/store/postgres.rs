//! Postgres-backed record store.
//!
//! All record kinds share one table:
//!
//! ```sql
//! records (kind, id, unique_key, data jsonb, created_at, updated_at)
//!   PRIMARY KEY (kind, id), UNIQUE (kind, unique_key)
//! ```
//!
//! Every transaction runs at the configured isolation level (default
//! `SERIALIZABLE`), so concurrent writers surface as `40001` and get retried
//! by [`super::run_in_transaction`]. SQLSTATE codes are preserved by
//! [`super::error::map_sqlx_error`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row};
use tracing::instrument;
use uuid::Uuid;

use teatrade_core::{Page, PageRequest};

use super::error::{StoreError, map_sqlx_error};
use super::{Database, Filter, RawRecord, Transaction};
use crate::config::{DatabaseSettings, IsolationLevel};

#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    isolation: IsolationLevel,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool, isolation: IsolationLevel) -> Self {
        Self { pool, isolation }
    }

    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .connect(&settings.url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        tracing::info!(max_connections = settings.max_connections, "connected to postgres");
        Ok(Self::new(pool, settings.isolation))
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        tracing::info!("running database migrations");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database {
                code: None,
                message: format!("migrate: {e}"),
            })?;
        tracing::info!("migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    #[instrument(skip(self), err)]
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("begin", e))?;
        sqlx::query(self.isolation.set_statement())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set isolation", e))?;
        Ok(Box::new(PostgresTransaction { tx: Some(tx) }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Dropping an open transaction rolls it back (sqlx behaviour).
struct PostgresTransaction {
    tx: Option<sqlx::Transaction<'static, Postgres>>,
}

impl PostgresTransaction {
    fn conn(&mut self) -> Result<&mut sqlx::Transaction<'static, Postgres>, StoreError> {
        self.tx.as_mut().ok_or(StoreError::TransactionClosed)
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    #[instrument(skip(self, record), fields(id = %record.id), err)]
    async fn insert(&mut self, kind: &str, record: RawRecord) -> Result<(), StoreError> {
        let tx = self.conn()?;
        sqlx::query(
            r#"
            INSERT INTO records (kind, id, unique_key, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            "#,
        )
        .bind(kind)
        .bind(record.id)
        .bind(record.unique_key)
        .bind(record.data)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(id = %record.id), err)]
    async fn update(&mut self, kind: &str, record: RawRecord) -> Result<(), StoreError> {
        let tx = self.conn()?;
        let result = sqlx::query(
            r#"
            UPDATE records
            SET unique_key = $3, data = $4, updated_at = now()
            WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(kind)
        .bind(record.id)
        .bind(record.unique_key)
        .bind(record.data)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, kind: &str, id: Uuid) -> Result<(), StoreError> {
        let tx = self.conn()?;
        let result = sqlx::query("DELETE FROM records WHERE kind = $1 AND id = $2")
            .bind(kind)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get(&mut self, kind: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let tx = self.conn()?;
        let row = sqlx::query("SELECT data FROM records WHERE kind = $1 AND id = $2")
            .bind(kind)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.map(|r| r.try_get::<Value, _>("data"))
            .transpose()
            .map_err(|e| map_sqlx_error("get", e))
    }

    #[instrument(skip(self, filter), fields(filtered = !filter.is_empty()), err)]
    async fn list(&mut self, kind: &str, filter: &Filter, page: PageRequest) -> Result<Page<Value>, StoreError> {
        let tx = self.conn()?;
        let containment = filter.as_json();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE kind = $1 AND data @> $2")
            .bind(kind)
            .bind(&containment)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("list count", e))?;

        let rows = sqlx::query(
            r#"
            SELECT data FROM records
            WHERE kind = $1 AND data @> $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(kind)
        .bind(&containment)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        let items = rows
            .into_iter()
            .map(|r| r.try_get::<Value, _>("data"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("list", e))?;

        Ok(Page::new(items, total.max(0) as u64, page))
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::TransactionClosed)?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::TransactionClosed)?;
        tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))
    }
}
