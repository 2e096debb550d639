//! # Product Repository
//!
//! Read access to the product catalog, plus the inserts the seed binary and
//! tests need. Stock quantities change only through
//! [`StockLedger`](super::stock::StockLedger).

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use optica_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let lens = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Loads a product by id, whatever tenant owns it.
    ///
    /// Tenant ownership is the caller's decision: checkout rejects another
    /// tenant's product as forbidden rather than missing.
    pub async fn find(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, tenant_id, sku, name, kind,
                price_cents, cost_cents, stock_qty, stock_controlled,
                is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        self.find(&mut conn, id).await
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// `UniqueViolation` when the SKU already exists for the tenant.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, sku, name, kind,
                price_cents, cost_cents, stock_qty, stock_controlled,
                is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.kind)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock_qty)
        .bind(product.stock_controlled)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: product.sku.clone(),
            },
            other => other,
        })?;

        Ok(())
    }

    /// Turns stock control on or off for a product.
    ///
    /// With control off, sales may drive the quantity below zero.
    pub async fn set_stock_controlled(&self, id: &str, controlled: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET stock_controlled = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(controlled)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products of a tenant.
    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tenant_id = ?1 AND is_active = 1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::repository::fixtures;
    use crate::DbError;

    #[tokio::test]
    async fn test_insert_and_get_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = fixtures::product("LEN-001", 7);
        db.products().insert(&product).await.unwrap();

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.sku, "LEN-001");
        assert_eq!(loaded.stock_qty, 7);
        assert!(loaded.stock_controlled);
        assert_eq!(db.products().count(fixtures::TENANT).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&fixtures::product("ARM-001", 1)).await.unwrap();

        let err = db
            .products()
            .insert(&fixtures::product("ARM-001", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "ARM-001"));
    }

    #[tokio::test]
    async fn test_missing_product_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.products().get_by_id("nope").await.unwrap().is_none());
    }
}
