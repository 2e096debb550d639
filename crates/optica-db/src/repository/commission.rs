//! # Commission Repository
//!
//! One commission row per sale (unique index). Its status mirrors the sale:
//! PENDING while the sale is active, CANCELED while it is canceled.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use optica_core::{Commission, CommissionStatus};

#[derive(Debug, Clone)]
pub struct CommissionRepository {
    pool: SqlitePool,
}

impl CommissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CommissionRepository { pool }
    }

    pub async fn insert(&self, conn: &mut SqliteConnection, commission: &Commission) -> DbResult<()> {
        debug!(
            sale_id = %commission.sale_id,
            seller_id = %commission.seller_id,
            rate_bps = commission.rate_bps,
            amount = commission.amount_cents,
            "Recording commission"
        );

        sqlx::query(
            r#"
            INSERT INTO commissions (
                id, tenant_id, seller_id, sale_id, base_cents, rate_bps,
                amount_cents, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&commission.id)
        .bind(&commission.tenant_id)
        .bind(&commission.seller_id)
        .bind(&commission.sale_id)
        .bind(commission.base_cents)
        .bind(commission.rate_bps)
        .bind(commission.amount_cents)
        .bind(commission.status)
        .bind(commission.created_at)
        .bind(commission.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Moves the sale's commissions in status `from` to `to`.
    ///
    /// Amounts are never touched. Returns the number of rows moved.
    pub async fn transition_for_sale(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        from: CommissionStatus,
        to: CommissionStatus,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE commissions SET status = ?3, updated_at = ?4 WHERE sale_id = ?1 AND status = ?2",
        )
        .bind(sale_id)
        .bind(from)
        .bind(to)
        .bind(chrono::Utc::now())
        .execute(conn)
        .await?;

        debug!(sale_id = %sale_id, from = ?from, to = ?to, rows = result.rows_affected(), "Commission status moved");
        Ok(result.rows_affected())
    }

    pub async fn find_by_sale(&self, sale_id: &str) -> DbResult<Option<Commission>> {
        let commission = sqlx::query_as::<_, Commission>(
            r#"
            SELECT id, tenant_id, seller_id, sale_id, base_cents, rate_bps,
                   amount_cents, status, created_at, updated_at
            FROM commissions
            WHERE sale_id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(commission)
    }
}
