//! # Seller Repository
//!
//! Seller profiles; only the personal commission rate matters to a sale.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use optica_core::Seller;

#[derive(Debug, Clone)]
pub struct SellerRepository {
    pool: SqlitePool,
}

impl SellerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SellerRepository { pool }
    }

    pub async fn find(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
    ) -> DbResult<Option<Seller>> {
        let seller = sqlx::query_as::<_, Seller>(
            r#"
            SELECT id, tenant_id, name, commission_bps, is_active, created_at
            FROM sellers
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(conn)
        .await?;

        Ok(seller)
    }

    pub async fn insert(&self, seller: &Seller) -> DbResult<()> {
        debug!(id = %seller.id, bps = ?seller.commission_bps, "Inserting seller");

        sqlx::query(
            r#"
            INSERT INTO sellers (id, tenant_id, name, commission_bps, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&seller.id)
        .bind(&seller.tenant_id)
        .bind(&seller.name)
        .bind(seller.commission_bps)
        .bind(seller.is_active)
        .bind(seller.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::repository::fixtures;
    use optica_core::Rate;

    #[tokio::test]
    async fn test_seller_rate_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seller = fixtures::seller(Some(300));
        db.sellers().insert(&seller).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let found = db
            .sellers()
            .find(&mut conn, fixtures::TENANT, &seller.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.commission_rate(), Some(Rate::from_bps(300)));
    }
}
