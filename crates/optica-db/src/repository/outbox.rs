//! # Sale Outbox Repository
//!
//! Queue of sale lifecycle events for the reporting and CRM consumers.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleTransactionManager::create / cancel / reactivate                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────── SINGLE TRANSACTION ───────────────────────┐  │
//! │  │  stock, sale rows, payments, cash ledger, commission             │  │
//! │  │  INSERT INTO sale_outbox (event_type, sale_id, payload)          │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← the event exists iff the change exists                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Consumer (out of tree)                                                │
//! │    get_pending(n) → deliver → mark_delivered / mark_failed             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use optica_core::SaleOutboxEntry;

/// Event names written by the sale engine.
pub mod events {
    pub const SALE_CREATED: &str = "sale.created";
    pub const SALE_CANCELED: &str = "sale.canceled";
    pub const SALE_REACTIVATED: &str = "sale.reactivated";
}

/// Repository for sale outbox operations.
#[derive(Debug, Clone)]
pub struct SaleOutboxRepository {
    pool: SqlitePool,
}

impl SaleOutboxRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleOutboxRepository { pool }
    }

    /// Queues an event inside the caller's transaction.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let payload = serde_json::to_string(&detail)?;
    /// db.outbox().enqueue(&mut *tx, tenant, events::SALE_CREATED, &detail.sale.id, &payload).await?;
    /// ```
    pub async fn enqueue(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        event_type: &str,
        sale_id: &str,
        payload: &str,
    ) -> DbResult<SaleOutboxEntry> {
        let entry = SaleOutboxEntry {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            event_type: event_type.to_string(),
            sale_id: sale_id.to_string(),
            payload: payload.to_string(),
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            attempted_at: None,
            delivered_at: None,
        };

        debug!(event_type = %event_type, sale_id = %sale_id, "Queuing sale event");

        sqlx::query(
            r#"
            INSERT INTO sale_outbox (
                id, tenant_id, event_type, sale_id, payload,
                attempts, last_error, created_at, attempted_at, delivered_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.event_type)
        .bind(&entry.sale_id)
        .bind(&entry.payload)
        .bind(entry.attempts)
        .bind(&entry.last_error)
        .bind(entry.created_at)
        .bind(entry.attempted_at)
        .bind(entry.delivered_at)
        .execute(conn)
        .await?;

        Ok(entry)
    }

    /// Undelivered entries, oldest first.
    pub async fn get_pending(&self, limit: u32) -> DbResult<Vec<SaleOutboxEntry>> {
        let entries = sqlx::query_as::<_, SaleOutboxEntry>(
            r#"
            SELECT id, tenant_id, event_type, sale_id, payload,
                   attempts, last_error, created_at, attempted_at, delivered_at
            FROM sale_outbox
            WHERE delivered_at IS NULL
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Every event of a sale, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<SaleOutboxEntry>> {
        let entries = sqlx::query_as::<_, SaleOutboxEntry>(
            r#"
            SELECT id, tenant_id, event_type, sale_id, payload,
                   attempts, last_error, created_at, attempted_at, delivered_at
            FROM sale_outbox
            WHERE sale_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn mark_delivered(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE sale_outbox SET delivered_at = ?2, attempted_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Outbox entry", id));
        }

        Ok(())
    }

    /// Records a failed delivery attempt.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sale_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Outbox entry", id));
        }

        Ok(())
    }

    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sale_outbox WHERE delivered_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Deletes entries delivered more than `days_old` days ago.
    ///
    /// ## Returns
    /// Number of deleted entries.
    pub async fn cleanup_delivered(&self, days_old: u32) -> DbResult<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(days_old));

        let result = sqlx::query(
            "DELETE FROM sale_outbox WHERE delivered_at IS NOT NULL AND delivered_at < ?1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::fixtures::TENANT;

    async fn queue(db: &Database, sale_id: &str) -> SaleOutboxEntry {
        let mut conn = db.pool().acquire().await.unwrap();
        db.outbox()
            .enqueue(&mut conn, TENANT, events::SALE_CREATED, sale_id, "{}")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_pending_until_delivered() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = queue(&db, "sale-1").await;
        queue(&db, "sale-2").await;

        let outbox = db.outbox();
        assert_eq!(outbox.count_pending().await.unwrap(), 2);

        let pending = outbox.get_pending(10).await.unwrap();
        assert_eq!(pending[0].id, first.id);

        outbox.mark_delivered(&first.id).await.unwrap();
        assert_eq!(outbox.count_pending().await.unwrap(), 1);
        assert_eq!(outbox.get_pending(10).await.unwrap()[0].sale_id, "sale-2");
    }

    #[tokio::test]
    async fn test_mark_failed_counts_attempts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let entry = queue(&db, "sale-1").await;

        db.outbox().mark_failed(&entry.id, "CRM offline").await.unwrap();
        db.outbox().mark_failed(&entry.id, "CRM offline").await.unwrap();

        let pending = db.outbox().get_pending(1).await.unwrap();
        assert_eq!(pending[0].attempts, 2);
        assert_eq!(pending[0].last_error.as_deref(), Some("CRM offline"));
        assert!(pending[0].attempted_at.is_some());

        assert!(db.outbox().mark_failed("missing", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_and_pending() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let delivered = queue(&db, "sale-1").await;
        queue(&db, "sale-2").await;
        db.outbox().mark_delivered(&delivered.id).await.unwrap();

        assert_eq!(db.outbox().cleanup_delivered(30).await.unwrap(), 0);
        assert_eq!(db.outbox().list_for_sale("sale-1").await.unwrap().len(), 1);
        assert_eq!(db.outbox().count_pending().await.unwrap(), 1);
    }
}
