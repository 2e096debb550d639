//! # Stock Ledger
//!
//! The only writer of `products.stock_qty`.
//!
//! ## Conditional Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  read qty → compute → write qty        ✗  two sales both see qty = 1   │
//! │                                                                         │
//! │  UPDATE products                                                       │
//! │     SET stock_qty = stock_qty + :delta                                 │
//! │   WHERE id = :id                                                       │
//! │     AND (:allow_negative OR stock_qty + :delta >= 0)                   │
//! │  RETURNING stock_qty                   ✓  the loser matches 0 rows     │
//! │                                                                         │
//! │  0 rows → re-read the row to tell NotFound from InsufficientStock      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every applied adjustment appends a `stock_movements` audit row in the same
//! connection, so the audit commits or rolls back with the sale.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use optica_core::{StockMovement, StockMovementReason};

/// One requested change to a product's on-hand quantity.
#[derive(Debug, Clone, Copy)]
pub struct StockAdjustment<'a> {
    pub tenant_id: &'a str,
    pub product_id: &'a str,
    /// Negative to take units out, positive to put them back.
    pub delta: i64,
    /// Skip the non-negative guard (uncontrolled products, restores).
    pub allow_negative: bool,
    pub reason: StockMovementReason,
    pub sale_id: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Applies `adjustment` atomically and returns the new quantity.
    ///
    /// ## Errors
    /// - `InsufficientStock` when the guard rejects the change
    /// - `NotFound` when the product doesn't exist for the tenant
    pub async fn adjust(
        &self,
        conn: &mut SqliteConnection,
        adjustment: StockAdjustment<'_>,
    ) -> DbResult<i64> {
        let now = Utc::now();

        let new_qty: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
               SET stock_qty = stock_qty + ?2,
                   updated_at = ?4
             WHERE id = ?1
               AND tenant_id = ?5
               AND (?3 OR stock_qty + ?2 >= 0)
            RETURNING stock_qty
            "#,
        )
        .bind(adjustment.product_id)
        .bind(adjustment.delta)
        .bind(adjustment.allow_negative)
        .bind(now)
        .bind(adjustment.tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(new_qty) = new_qty else {
            return Err(self.rejection(conn, &adjustment).await);
        };

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, tenant_id, product_id, sale_id,
                quantity_delta, resulting_qty, reason, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(adjustment.tenant_id)
        .bind(adjustment.product_id)
        .bind(adjustment.sale_id)
        .bind(adjustment.delta)
        .bind(new_qty)
        .bind(adjustment.reason)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        debug!(
            product_id = %adjustment.product_id,
            delta = adjustment.delta,
            new_qty,
            reason = ?adjustment.reason,
            "Stock adjusted"
        );

        Ok(new_qty)
    }

    /// Explains why the conditional update matched nothing.
    async fn rejection(&self, conn: &mut SqliteConnection, adjustment: &StockAdjustment<'_>) -> DbError {
        let row: Result<Option<(String, i64)>, sqlx::Error> = sqlx::query_as(
            "SELECT name, stock_qty FROM products WHERE id = ?1 AND tenant_id = ?2",
        )
        .bind(adjustment.product_id)
        .bind(adjustment.tenant_id)
        .fetch_optional(conn)
        .await;

        match row {
            Ok(Some((name, available))) => DbError::InsufficientStock {
                product_id: adjustment.product_id.to_string(),
                name,
                available,
                requested: -adjustment.delta,
            },
            Ok(None) => DbError::not_found("Product", adjustment.product_id),
            Err(e) => e.into(),
        }
    }

    /// Audit trail of a product, oldest first.
    pub async fn list_movements(&self, product_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, tenant_id, product_id, sale_id,
                   quantity_delta, resulting_qty, reason, created_at
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::fixtures;

    fn take<'a>(product_id: &'a str, qty: i64) -> StockAdjustment<'a> {
        StockAdjustment {
            tenant_id: fixtures::TENANT,
            product_id,
            delta: -qty,
            allow_negative: false,
            reason: StockMovementReason::Sale,
            sale_id: None,
        }
    }

    #[tokio::test]
    async fn test_decrement_within_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = fixtures::product("LEN-001", 3);
        db.products().insert(&product).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let qty = db.stock().adjust(&mut conn, take(&product.id, 3)).await.unwrap();
        assert_eq!(qty, 0);
        drop(conn);

        let movements = db.stock().list_movements(&product.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity_delta, -3);
        assert_eq!(movements[0].resulting_qty, 0);
        assert_eq!(movements[0].reason, StockMovementReason::Sale);
    }

    #[tokio::test]
    async fn test_decrement_beyond_stock_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = fixtures::product("LEN-002", 1);
        db.products().insert(&product).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let err = db.stock().adjust(&mut conn, take(&product.id, 2)).await.unwrap_err();
        drop(conn);

        match err {
            DbError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let reloaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock_qty, 1);
        assert!(db.stock().list_movements(&product.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_allow_negative_skips_guard() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = fixtures::product("LC-001", 0);
        db.products().insert(&product).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let mut adjustment = take(&product.id, 2);
        adjustment.allow_negative = true;
        let qty = db.stock().adjust(&mut conn, adjustment).await.unwrap();
        assert_eq!(qty, -2);
    }

    #[tokio::test]
    async fn test_unknown_or_foreign_product_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = fixtures::product("ARM-001", 5);
        db.products().insert(&product).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let err = db.stock().adjust(&mut conn, take("missing", 1)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let mut foreign = take(&product.id, 1);
        foreign.tenant_id = "tenant-b";
        let err = db.stock().adjust(&mut conn, foreign).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
