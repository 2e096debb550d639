//! # Customer Repository
//!
//! The customer registry as the sale engine sees it: existence, active flag and
//! store-credit limit.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use optica_core::Customer;

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Loads a customer owned by `tenant_id`.
    pub async fn find(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
    ) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, tenant_id, name, document, credit_limit_cents, is_active, created_at
            FROM customers
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(conn)
        .await?;

        Ok(customer)
    }

    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        self.find(&mut conn, tenant_id, id).await
    }

    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, limit = ?customer.credit_limit_cents, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, tenant_id, name, document, credit_limit_cents, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.tenant_id)
        .bind(&customer.name)
        .bind(&customer.document)
        .bind(customer.credit_limit_cents)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
