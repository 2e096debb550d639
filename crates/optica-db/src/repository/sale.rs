//! # Sale Repository
//!
//! Database operations for sales, sale items and sale payments.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (one transaction)                                           │
//! │     └── insert_sale()    → Sale { status: Completed }                  │
//! │     └── insert_item()    → SaleItem (position 0..n, snapshots)         │
//! │     └── insert_payment() → SalePayment { status: Received }            │
//! │                                                                         │
//! │  2. CANCEL                                                             │
//! │     └── set_payment_status(Voided) for each received payment           │
//! │     └── mark_canceled()  → Sale { status: Canceled, cancel_reason }    │
//! │                                                                         │
//! │  3. REACTIVATE                                                         │
//! │     └── mark_completed() → Sale { status: Completed }                  │
//! │         (payment rows keep their status)                               │
//! │                                                                         │
//! │  Rows are never deleted.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use optica_core::{PaymentStatus, Sale, SaleDetail, SaleItem, SalePayment, SaleStatus};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub async fn insert_sale(&self, conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, total = sale.total_cents, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, branch_id, customer_id, seller_id,
                subtotal_cents, discount_cents, total_cents, status,
                notes, cancel_reason, canceled_at, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(&sale.branch_id)
        .bind(&sale.customer_id)
        .bind(&sale.seller_id)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.status)
        .bind(&sale.notes)
        .bind(&sale.cancel_reason)
        .bind(sale.canceled_at)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts a sale line.
    ///
    /// ## Snapshot Pattern
    /// Name and unit cost are copied from the product so later catalog edits
    /// don't rewrite history.
    pub async fn insert_item(&self, conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        debug!(sale_id = %item.sale_id, product_id = %item.product_id, qty = item.quantity, "Adding sale item");

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, position, name_snapshot,
                quantity, unit_price_cents, unit_cost_cents, discount_cents,
                line_total_cents, moves_stock, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(item.position)
        .bind(&item.name_snapshot)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.unit_cost_cents)
        .bind(item.discount_cents)
        .bind(item.line_total_cents)
        .bind(item.moves_stock)
        .bind(item.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn insert_payment(&self, conn: &mut SqliteConnection, payment: &SalePayment) -> DbResult<()> {
        debug!(sale_id = %payment.sale_id, method = %payment.method, amount = payment.amount_cents, "Recording payment");

        sqlx::query(
            r#"
            INSERT INTO sale_payments (
                id, sale_id, position, method, amount_cents,
                installments, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.position)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(payment.installments)
        .bind(payment.status)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn set_payment_status(
        &self,
        conn: &mut SqliteConnection,
        payment_id: &str,
        status: PaymentStatus,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE sale_payments SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(payment_id)
            .bind(status)
            .bind(Utc::now())
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale payment", payment_id));
        }

        Ok(())
    }

    /// COMPLETED → CANCELED.
    pub async fn mark_canceled(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sales SET
                status = 'canceled',
                cancel_reason = ?2,
                canceled_at = ?3,
                updated_at = ?3
            WHERE id = ?1 AND status = 'completed'
            "#,
        )
        .bind(sale_id)
        .bind(reason)
        .bind(at)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale (completed)", sale_id));
        }

        Ok(())
    }

    /// CANCELED/REFUNDED → COMPLETED. Clears the cancel reason and timestamp.
    pub async fn mark_completed(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sales SET
                status = 'completed',
                cancel_reason = NULL,
                canceled_at = NULL,
                updated_at = ?2
            WHERE id = ?1 AND status IN ('canceled', 'refunded')
            "#,
        )
        .bind(sale_id)
        .bind(at)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale (inactive)", sale_id));
        }

        Ok(())
    }

    /// Sets a status directly. Used by the refund flow, which lives outside
    /// this engine.
    pub async fn set_status(&self, sale_id: &str, status: SaleStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(sale_id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Loads a sale header owned by `tenant_id`.
    pub async fn find_sale(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        sale_id: &str,
    ) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, tenant_id, branch_id, customer_id, seller_id,
                   subtotal_cents, discount_cents, total_cents, status,
                   notes, cancel_reason, canceled_at, created_at, updated_at
            FROM sales
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(sale_id)
        .bind(tenant_id)
        .fetch_optional(conn)
        .await?;

        Ok(sale)
    }

    /// Lines of a sale in checkout order.
    pub async fn find_items(&self, conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, position, name_snapshot,
                   quantity, unit_price_cents, unit_cost_cents, discount_cents,
                   line_total_cents, moves_stock, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(sale_id)
        .fetch_all(conn)
        .await?;

        Ok(items)
    }

    /// Payments of a sale in tender order, whatever their status.
    pub async fn find_payments(&self, conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SalePayment>> {
        let payments = sqlx::query_as::<_, SalePayment>(
            r#"
            SELECT id, sale_id, position, method, amount_cents,
                   installments, status, created_at, updated_at
            FROM sale_payments
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(sale_id)
        .fetch_all(conn)
        .await?;

        Ok(payments)
    }

    /// Header, items and payments read through one connection.
    pub async fn load_detail(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        sale_id: &str,
    ) -> DbResult<Option<SaleDetail>> {
        let Some(sale) = self.find_sale(&mut *conn, tenant_id, sale_id).await? else {
            return Ok(None);
        };
        let items = self.find_items(&mut *conn, sale_id).await?;
        let payments = self.find_payments(&mut *conn, sale_id).await?;

        Ok(Some(SaleDetail { sale, items, payments }))
    }

    pub async fn get_detail(&self, tenant_id: &str, sale_id: &str) -> DbResult<Option<SaleDetail>> {
        let mut conn = self.pool.acquire().await?;
        self.load_detail(&mut conn, tenant_id, sale_id).await
    }

    /// Counts sales of a tenant by status.
    pub async fn count_by_status(&self, tenant_id: &str, status: SaleStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE tenant_id = ?1 AND status = ?2")
            .bind(tenant_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::fixtures::{self, TENANT};
    use optica_core::PaymentMethod;
    use uuid::Uuid;

    fn sale() -> Sale {
        let now = Utc::now();
        Sale {
            id: Uuid::new_v4().to_string(),
            tenant_id: TENANT.to_string(),
            branch_id: "loja-centro".to_string(),
            customer_id: None,
            seller_id: "seller-1".to_string(),
            subtotal_cents: 20_000,
            discount_cents: 0,
            total_cents: 20_000,
            status: SaleStatus::Completed,
            notes: Some("óculos de grau".to_string()),
            cancel_reason: None,
            canceled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(sale_id: &str, product_id: &str, position: i64) -> SaleItem {
        SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            product_id: product_id.to_string(),
            position,
            name_snapshot: "Lente Antirreflexo".to_string(),
            quantity: 2,
            unit_price_cents: 10_000,
            unit_cost_cents: 4_000,
            discount_cents: 0,
            line_total_cents: 20_000,
            moves_stock: true,
            created_at: Utc::now(),
        }
    }

    fn payment(sale_id: &str, position: i64, method: PaymentMethod, cents: i64) -> SalePayment {
        let now = Utc::now();
        SalePayment {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            position,
            method,
            amount_cents: cents,
            installments: 1,
            status: PaymentStatus::Received,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seeded(db: &Database) -> (Sale, SalePayment) {
        let product = fixtures::product("LEN-010", 10);
        db.products().insert(&product).await.unwrap();

        let sale = sale();
        let pix = payment(&sale.id, 1, PaymentMethod::Pix, 5_000);
        let mut tx = db.begin_immediate().await.unwrap();
        let repo = db.sales();
        repo.insert_sale(&mut tx, &sale).await.unwrap();
        repo.insert_item(&mut tx, &item(&sale.id, &product.id, 0)).await.unwrap();
        repo.insert_payment(&mut tx, &payment(&sale.id, 0, PaymentMethod::Cash, 15_000))
            .await
            .unwrap();
        repo.insert_payment(&mut tx, &pix).await.unwrap();
        tx.commit().await.unwrap();

        (sale, pix)
    }

    #[tokio::test]
    async fn test_detail_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (sale, _) = seeded(&db).await;

        let detail = db.sales().get_detail(TENANT, &sale.id).await.unwrap().unwrap();
        assert_eq!(detail.sale.status, SaleStatus::Completed);
        assert_eq!(detail.items.len(), 1);
        assert!(detail.items[0].moves_stock);
        assert_eq!(detail.payments.len(), 2);
        assert_eq!(detail.payments[0].method, PaymentMethod::Cash);
        assert_eq!(detail.payments_total().cents(), 20_000);

        assert!(db.sales().get_detail("tenant-b", &sale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_and_complete_transitions() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (sale, pix) = seeded(&db).await;
        let repo = db.sales();

        let mut conn = db.pool().acquire().await.unwrap();
        repo.set_payment_status(&mut conn, &pix.id, PaymentStatus::Voided).await.unwrap();
        repo.mark_canceled(&mut conn, &sale.id, Some("lente errada"), Utc::now())
            .await
            .unwrap();

        // A second cancel finds no completed row.
        assert!(repo.mark_canceled(&mut conn, &sale.id, None, Utc::now()).await.is_err());

        let canceled = repo.load_detail(&mut conn, TENANT, &sale.id).await.unwrap().unwrap();
        assert_eq!(canceled.sale.status, SaleStatus::Canceled);
        assert_eq!(canceled.sale.cancel_reason.as_deref(), Some("lente errada"));
        assert!(canceled.sale.canceled_at.is_some());
        assert_eq!(canceled.payments[1].status, PaymentStatus::Voided);

        repo.mark_completed(&mut conn, &sale.id, Utc::now()).await.unwrap();
        let active = repo.load_detail(&mut conn, TENANT, &sale.id).await.unwrap().unwrap();
        assert_eq!(active.sale.status, SaleStatus::Completed);
        assert!(active.sale.canceled_at.is_none());
        assert!(active.sale.cancel_reason.is_none());
        assert_eq!(active.payments[1].status, PaymentStatus::Voided);
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (sale, _) = seeded(&db).await;

        db.sales().set_status(&sale.id, SaleStatus::Refunded).await.unwrap();
        assert_eq!(db.sales().count_by_status(TENANT, SaleStatus::Refunded).await.unwrap(), 1);
        assert_eq!(db.sales().count_by_status(TENANT, SaleStatus::Completed).await.unwrap(), 0);
    }
}
