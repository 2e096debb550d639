//! # Cash Shifts and Cash Movements
//!
//! ## Ledger Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cash_shifts          one OPEN row per branch (partial unique index)   │
//! │       │                                                                 │
//! │       │ 1..n                                                            │
//! │       ▼                                                                 │
//! │  cash_movements       append-only                                      │
//! │    IN  R$300,00 pix   origin = sale_payment/<payment id>  (create)     │
//! │    OUT R$300,00 pix   origin = sale_payment/<payment id>  (cancel)     │
//! │    IN  R$300,00 pix   origin = sale_payment/<payment id>  (reactivate) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Movements are never updated or deleted; reversals are new OUT rows.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use optica_core::{CashMovement, CashShift, PaymentMethod, ShiftStatus};

// =============================================================================
// Cash Shifts
// =============================================================================

/// Minimal register-session management: the sale engine only asks whether a
/// branch has an open shift.
#[derive(Debug, Clone)]
pub struct CashShiftRepository {
    pool: SqlitePool,
}

impl CashShiftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashShiftRepository { pool }
    }

    /// Opens a shift for a branch.
    ///
    /// ## Errors
    /// `UniqueViolation` if the branch already has an open shift.
    pub async fn open(
        &self,
        tenant_id: &str,
        branch_id: &str,
        opened_by: &str,
        opening_balance_cents: i64,
    ) -> DbResult<CashShift> {
        let shift = CashShift {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            branch_id: branch_id.to_string(),
            status: ShiftStatus::Open,
            opened_by: opened_by.to_string(),
            opening_balance_cents,
            opened_at: Utc::now(),
            closed_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO cash_shifts (
                id, tenant_id, branch_id, status, opened_by,
                opening_balance_cents, opened_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.tenant_id)
        .bind(&shift.branch_id)
        .bind(shift.status)
        .bind(&shift.opened_by)
        .bind(shift.opening_balance_cents)
        .bind(shift.opened_at)
        .bind(shift.closed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("open shift for branch", branch_id),
            other => other,
        })?;

        info!(shift_id = %shift.id, branch_id = %branch_id, "Cash shift opened");
        Ok(shift)
    }

    /// Closes an open shift.
    pub async fn close(&self, shift_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE cash_shifts SET status = 'closed', closed_at = ?2 WHERE id = ?1 AND status = 'open'",
        )
        .bind(shift_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open cash shift", shift_id));
        }

        info!(shift_id = %shift_id, "Cash shift closed");
        Ok(())
    }

    /// The branch's currently open shift, if any.
    pub async fn find_open(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        branch_id: &str,
    ) -> DbResult<Option<CashShift>> {
        let shift = sqlx::query_as::<_, CashShift>(
            r#"
            SELECT id, tenant_id, branch_id, status, opened_by,
                   opening_balance_cents, opened_at, closed_at
            FROM cash_shifts
            WHERE tenant_id = ?1 AND branch_id = ?2 AND status = 'open'
            "#,
        )
        .bind(tenant_id)
        .bind(branch_id)
        .fetch_optional(conn)
        .await?;

        Ok(shift)
    }

    pub async fn get_open(&self, tenant_id: &str, branch_id: &str) -> DbResult<Option<CashShift>> {
        let mut conn = self.pool.acquire().await?;
        self.find_open(&mut conn, tenant_id, branch_id).await
    }
}

// =============================================================================
// Cash Movements
// =============================================================================

/// Net cash flow of one payment method within a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MethodTotal {
    pub method: PaymentMethod,
    /// Σ IN − Σ OUT, in centavos.
    pub net_cents: i64,
    pub movements: i64,
}

#[derive(Debug, Clone)]
pub struct CashMovementRepository {
    pool: SqlitePool,
}

impl CashMovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashMovementRepository { pool }
    }

    /// Appends a ledger entry.
    pub async fn insert(&self, conn: &mut SqliteConnection, movement: &CashMovement) -> DbResult<()> {
        debug!(
            shift_id = %movement.shift_id,
            direction = ?movement.direction,
            method = %movement.method,
            amount = movement.amount_cents,
            origin_id = %movement.origin_id,
            "Recording cash movement"
        );

        sqlx::query(
            r#"
            INSERT INTO cash_movements (
                id, tenant_id, shift_id, branch_id, direction, method, amount_cents,
                origin_type, origin_id, actor_id, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.tenant_id)
        .bind(&movement.shift_id)
        .bind(&movement.branch_id)
        .bind(movement.direction)
        .bind(movement.method)
        .bind(movement.amount_cents)
        .bind(&movement.origin_type)
        .bind(&movement.origin_id)
        .bind(&movement.actor_id)
        .bind(&movement.note)
        .bind(movement.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Entries that trace back to one origin row, oldest first.
    pub async fn list_by_origin(&self, origin_type: &str, origin_id: &str) -> DbResult<Vec<CashMovement>> {
        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, tenant_id, shift_id, branch_id, direction, method, amount_cents,
                   origin_type, origin_id, actor_id, note, created_at
            FROM cash_movements
            WHERE origin_type = ?1 AND origin_id = ?2
            ORDER BY created_at, rowid
            "#,
        )
        .bind(origin_type)
        .bind(origin_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Every entry written for the payments of a sale, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<CashMovement>> {
        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT m.id, m.tenant_id, m.shift_id, m.branch_id, m.direction, m.method,
                   m.amount_cents, m.origin_type, m.origin_id, m.actor_id, m.note, m.created_at
            FROM cash_movements m
            JOIN sale_payments p ON p.id = m.origin_id
            WHERE m.origin_type = 'sale_payment' AND p.sale_id = ?1
            ORDER BY m.created_at, m.rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Net flow per payment method for a shift, for closing reconciliation.
    pub async fn shift_summary(&self, shift_id: &str) -> DbResult<Vec<MethodTotal>> {
        let totals = sqlx::query_as::<_, MethodTotal>(
            r#"
            SELECT method,
                   SUM(CASE direction WHEN 'in' THEN amount_cents ELSE -amount_cents END) AS net_cents,
                   COUNT(*) AS movements
            FROM cash_movements
            WHERE shift_id = ?1
            GROUP BY method
            ORDER BY method
            "#,
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::fixtures::TENANT;
    use optica_core::MovementDirection;

    fn movement(shift: &CashShift, direction: MovementDirection, method: PaymentMethod, cents: i64) -> CashMovement {
        CashMovement {
            id: Uuid::new_v4().to_string(),
            tenant_id: TENANT.to_string(),
            shift_id: shift.id.clone(),
            branch_id: shift.branch_id.clone(),
            direction,
            method,
            amount_cents: cents,
            origin_type: "manual".to_string(),
            origin_id: "origin-1".to_string(),
            actor_id: "user-1".to_string(),
            note: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_one_open_shift_per_branch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shift = db.shifts().open(TENANT, "loja-centro", "user-1", 10_000).await.unwrap();

        let err = db.shifts().open(TENANT, "loja-centro", "user-2", 0).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        db.shifts().close(&shift.id).await.unwrap();
        assert!(db.shifts().get_open(TENANT, "loja-centro").await.unwrap().is_none());

        let reopened = db.shifts().open(TENANT, "loja-centro", "user-2", 0).await.unwrap();
        let open = db.shifts().get_open(TENANT, "loja-centro").await.unwrap().unwrap();
        assert_eq!(open.id, reopened.id);
        assert_eq!(open.status, ShiftStatus::Open);
    }

    #[tokio::test]
    async fn test_close_twice_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shift = db.shifts().open(TENANT, "loja-norte", "user-1", 0).await.unwrap();
        db.shifts().close(&shift.id).await.unwrap();
        assert!(db.shifts().close(&shift.id).await.is_err());
    }

    #[tokio::test]
    async fn test_shift_summary_nets_by_method() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shift = db.shifts().open(TENANT, "loja-sul", "user-1", 0).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let repo = db.cash_movements();
        for m in [
            movement(&shift, MovementDirection::In, PaymentMethod::Cash, 5_000),
            movement(&shift, MovementDirection::In, PaymentMethod::Pix, 12_000),
            movement(&shift, MovementDirection::Out, PaymentMethod::Pix, 2_000),
        ] {
            repo.insert(&mut conn, &m).await.unwrap();
        }
        drop(conn);

        let summary = repo.shift_summary(&shift.id).await.unwrap();
        assert_eq!(summary.len(), 2);

        let pix = summary.iter().find(|t| t.method == PaymentMethod::Pix).unwrap();
        assert_eq!(pix.net_cents, 10_000);
        assert_eq!(pix.movements, 2);

        let by_origin = repo.list_by_origin("manual", "origin-1").await.unwrap();
        assert_eq!(by_origin.len(), 3);
    }
}
