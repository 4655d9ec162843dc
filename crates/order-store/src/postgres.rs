use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Result, StoreError, Version,
    store::{MutationFn, OrderStore, apply_mutation},
};

/// PostgreSQL-backed order store.
///
/// The aggregate is persisted as a JSONB payload next to its version
/// counter; conflicts are detected by the affected-row count of
/// `UPDATE … WHERE id = $1 AND version = $2`, so the read-modify-write
/// window is never locked.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<(Order, Version)> {
        let version = Version::new(row.try_get("version")?);
        let payload: serde_json::Value = row.try_get("payload")?;
        let order: Order = serde_json::from_value(payload)?;
        Ok((order, version))
    }

    async fn current_version(&self, order_id: OrderId) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        Ok(version.map(Version::new))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn get(&self, order_id: OrderId) -> Result<(Order, Version)> {
        let row = sqlx::query("SELECT version, payload FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(order_id))?;

        Self::row_to_order(row)
    }

    async fn create(&self, order: Order) -> Result<(Order, Version)> {
        order.validate().map_err(StoreError::InvariantViolation)?;

        let version = Version::initial();
        let payload = serde_json::to_value(&order)?;

        sqlx::query(
            "INSERT INTO orders (id, version, payload, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(order.id().as_uuid())
        .bind(version.as_i64())
        .bind(&payload)
        .bind(order.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::AlreadyExists(order.id());
            }
            StoreError::Database(e)
        })?;

        Ok((order, version))
    }

    #[tracing::instrument(skip(self, mutation))]
    async fn commit(
        &self,
        order_id: OrderId,
        expected: Version,
        mutation: MutationFn,
    ) -> Result<(Order, Version)> {
        let (current, actual) = self.get(order_id).await?;

        if actual != expected {
            metrics::counter!("order_store_commit_conflicts_total").increment(1);
            return Err(StoreError::VersionConflict {
                order_id,
                expected,
                actual,
            });
        }

        let next = apply_mutation(&current, mutation)?;
        let next_version = expected.next();
        let payload = serde_json::to_value(&next)?;

        let result =
            sqlx::query("UPDATE orders SET version = $2, payload = $3 WHERE id = $1 AND version = $4")
                .bind(order_id.as_uuid())
                .bind(next_version.as_i64())
                .bind(&payload)
                .bind(expected.as_i64())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            // Someone committed between our read and our write.
            metrics::counter!("order_store_commit_conflicts_total").increment(1);
            return match self.current_version(order_id).await? {
                Some(actual) => Err(StoreError::VersionConflict {
                    order_id,
                    expected,
                    actual,
                }),
                None => Err(StoreError::NotFound(order_id)),
            };
        }

        metrics::counter!("order_store_commits_total").increment(1);
        Ok((next, next_version))
    }

    async fn delete(&self, order_id: OrderId, expected: Version) -> Result<()> {
        let (current, actual) = self.get(order_id).await?;

        if actual != expected {
            return Err(StoreError::VersionConflict {
                order_id,
                expected,
                actual,
            });
        }
        if current.is_paid() {
            return Err(StoreError::Forbidden(order_id));
        }

        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND version = $2")
            .bind(order_id.as_uuid())
            .bind(expected.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.current_version(order_id).await? {
                Some(actual) => Err(StoreError::VersionConflict {
                    order_id,
                    expected,
                    actual,
                }),
                None => Err(StoreError::NotFound(order_id)),
            };
        }

        Ok(())
    }

    async fn list(&self) -> Result<Vec<(Order, Version)>> {
        let rows = sqlx::query("SELECT version, payload FROM orders ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}
