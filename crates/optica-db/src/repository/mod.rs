//! # Repository Module
//!
//! Database repository implementations for the sale engine.
//!
//! ## Two Kinds of Methods
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Unit-of-work steps take an explicit connection:                       │
//! │                                                                         │
//! │    let mut tx = db.begin_immediate().await?;                           │
//! │    db.sales().insert_sale(&mut *tx, &sale).await?;                     │
//! │    db.stock().adjust(&mut *tx, adjustment).await?;                     │
//! │    tx.commit().await?;                                                 │
//! │                                                                         │
//! │  Standalone reads and registry writes use the pool:                    │
//! │                                                                         │
//! │    db.products().get_by_id("uuid").await?                              │
//! │    db.outbox().get_pending(50).await?                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog rows
//! - [`StockLedger`](stock::StockLedger) - Conditional stock adjustments + audit
//! - [`CustomerRepository`](customer::CustomerRepository) - Credit limits
//! - [`SellerRepository`](seller::SellerRepository) - Commission rates
//! - [`CashShiftRepository`](cash::CashShiftRepository) - Register sessions
//! - [`CashMovementRepository`](cash::CashMovementRepository) - Cash ledger
//! - [`SaleRepository`](sale::SaleRepository) - Sales, items and payments
//! - [`CommissionRepository`](commission::CommissionRepository) - Seller commissions
//! - [`ReceivableRepository`](receivable::ReceivableRepository) - Store-credit installments
//! - [`SaleOutboxRepository`](outbox::SaleOutboxRepository) - Sale event queue

pub mod cash;
pub mod commission;
pub mod customer;
pub mod outbox;
pub mod product;
pub mod receivable;
pub mod sale;
pub mod seller;
pub mod stock;

/// Row builders shared by repository tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use optica_core::{Customer, Product, ProductKind, Seller};
    use uuid::Uuid;

    pub const TENANT: &str = "tenant-a";

    pub fn product(sku: &str, stock_qty: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: TENANT.to_string(),
            sku: sku.to_string(),
            name: format!("Produto {}", sku),
            kind: ProductKind::Product,
            price_cents: 10_000,
            cost_cents: 4_000,
            stock_qty,
            stock_controlled: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn customer(credit_limit_cents: Option<i64>) -> Customer {
        Customer {
            id: Uuid::new_v4().to_string(),
            tenant_id: TENANT.to_string(),
            name: "Maria Souza".to_string(),
            document: Some("123.456.789-09".to_string()),
            credit_limit_cents,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn seller(commission_bps: Option<i64>) -> Seller {
        Seller {
            id: Uuid::new_v4().to_string(),
            tenant_id: TENANT.to_string(),
            name: "Ana Lima".to_string(),
            commission_bps,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
