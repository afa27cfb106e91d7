use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    BatchHandle, OrderHandle, OrderRecord, OrderStatus, Result, StatusStoreError, StatusUpdate,
    store::StatusStore,
};

const SELECT_COLUMNS: &str =
    "order_handle, batch_handle, account_id, status, failure, payload, created_at, updated_at";

/// PostgreSQL-backed status store implementation.
///
/// Every operation checks a connection out of the pool for exactly one unit
/// of work; the connection goes back to the pool when it is dropped, on
/// success and error paths alike.
#[derive(Clone)]
pub struct PostgresStatusStore {
    pool: PgPool,
}

impl PostgresStatusStore {
    /// Creates a new PostgreSQL status store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url` and creates a store over the pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<OrderRecord> {
        let status: String = row.try_get("status")?;
        Ok(OrderRecord {
            order_handle: OrderHandle::new(row.try_get::<String, _>("order_handle")?),
            batch_handle: BatchHandle::new(row.try_get::<String, _>("batch_handle")?),
            account_id: row.try_get("account_id")?,
            status: status
                .parse::<OrderStatus>()
                .map_err(StatusStoreError::InvalidStatus)?,
            failure: row.try_get("failure")?,
            payload: row.try_get("payload")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl StatusStore for PostgresStatusStore {
    async fn insert(&self, record: OrderRecord) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO order_status (order_handle, batch_handle, account_id, status, failure, payload, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (order_handle) DO NOTHING
            "#,
        )
        .bind(record.order_handle.as_str())
        .bind(record.batch_handle.as_str())
        .bind(&record.account_id)
        .bind(record.status.as_str())
        .bind(&record.failure)
        .bind(&record.payload)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StatusStoreError::AlreadyExists(record.order_handle));
        }

        metrics::counter!("status_store_writes_total", "op" => "insert").increment(1);
        Ok(())
    }

    async fn update(&self, handle: &OrderHandle, update: StatusUpdate) -> Result<OrderRecord> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM order_status WHERE order_handle = $1 FOR UPDATE")
                .bind(handle.as_str())
                .fetch_optional(&mut *tx)
                .await?;

        let current = current
            .ok_or_else(|| StatusStoreError::NotFound(handle.clone()))?
            .parse::<OrderStatus>()
            .map_err(StatusStoreError::InvalidStatus)?;

        if !current.can_transition_to(update.status) {
            tracing::warn!(%handle, status = %current, "rejected update of terminal order record");
            return Err(StatusStoreError::TerminalState {
                handle: handle.clone(),
                status: current,
            });
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE order_status
            SET status = $2, failure = $3, payload = $4, updated_at = $5
            WHERE order_handle = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(handle.as_str())
        .bind(update.status.as_str())
        .bind(&update.failure)
        .bind(&update.payload)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        metrics::counter!("status_store_writes_total", "op" => "update").increment(1);
        Self::row_to_record(row)
    }

    async fn get(&self, handle: &OrderHandle) -> Result<Option<OrderRecord>> {
        let mut conn = self.pool.acquire().await?;

        let row: Option<PgRow> = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM order_status WHERE order_handle = $1"
        ))
        .bind(handle.as_str())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn list_by_batch(&self, batch: &BatchHandle) -> Result<Vec<OrderRecord>> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM order_status WHERE batch_handle = $1 ORDER BY seq ASC"
        ))
        .bind(batch.as_str())
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}
