//! # Receivable Repository
//!
//! Store-credit (crediário) installments. This engine only creates PENDING
//! rows and reads exposure; collections settle them elsewhere.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use optica_core::AccountReceivable;

#[derive(Debug, Clone)]
pub struct ReceivableRepository {
    pool: SqlitePool,
}

impl ReceivableRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReceivableRepository { pool }
    }

    pub async fn insert(&self, conn: &mut SqliteConnection, receivable: &AccountReceivable) -> DbResult<()> {
        debug!(
            sale_id = %receivable.sale_id,
            installment = receivable.installment_number,
            of = receivable.installment_total,
            amount = receivable.amount_cents,
            due = %receivable.due_date,
            "Recording receivable"
        );

        sqlx::query(
            r#"
            INSERT INTO accounts_receivable (
                id, tenant_id, customer_id, sale_id, payment_id, amount_cents,
                due_date, installment_number, installment_total, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&receivable.id)
        .bind(&receivable.tenant_id)
        .bind(&receivable.customer_id)
        .bind(&receivable.sale_id)
        .bind(&receivable.payment_id)
        .bind(receivable.amount_cents)
        .bind(receivable.due_date)
        .bind(receivable.installment_number)
        .bind(receivable.installment_total)
        .bind(receivable.status)
        .bind(receivable.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Pending store credit of a customer.
    ///
    /// Installments of canceled sales stay PENDING and still count.
    pub async fn outstanding_for_customer(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        customer_id: &str,
    ) -> DbResult<i64> {
        let outstanding: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM accounts_receivable
            WHERE tenant_id = ?1
              AND customer_id = ?2
              AND status = 'pending'
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_one(conn)
        .await?;

        Ok(outstanding)
    }

    /// Installments of a sale by payment, then installment number.
    pub async fn list_by_sale(&self, sale_id: &str) -> DbResult<Vec<AccountReceivable>> {
        let receivables = sqlx::query_as::<_, AccountReceivable>(
            r#"
            SELECT r.id, r.tenant_id, r.customer_id, r.sale_id, r.payment_id, r.amount_cents,
                   r.due_date, r.installment_number, r.installment_total, r.status, r.created_at
            FROM accounts_receivable r
            JOIN sale_payments p ON p.id = r.payment_id
            WHERE r.sale_id = ?1
            ORDER BY p.position, r.installment_number
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(receivables)
    }
}
