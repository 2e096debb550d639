//! # optica-db: Database Layer for Optica
//!
//! SQLite persistence for the sale engine, through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Optica Data Flow                                 │
//! │                                                                         │
//! │  SaleTransactionManager (optica-sales)                                 │
//! │       │  let mut tx = db.begin_immediate().await?;                     │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    optica-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ StockLedger    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepository │    │ 0001_initial │  │   │
//! │  │   │ BEGIN         │    │ CashMovement…  │    │ _schema.sql  │  │   │
//! │  │   │ IMMEDIATE     │    │ SaleOutbox…    │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use optica_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("optica.db")).await?;
//! let shift = db.shifts().get_open(tenant_id, "loja-centro").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::cash::{CashMovementRepository, CashShiftRepository, MethodTotal};
pub use repository::commission::CommissionRepository;
pub use repository::customer::CustomerRepository;
pub use repository::outbox::{events, SaleOutboxRepository};
pub use repository::product::ProductRepository;
pub use repository::receivable::ReceivableRepository;
pub use repository::sale::SaleRepository;
pub use repository::seller::SellerRepository;
pub use repository::stock::{StockAdjustment, StockLedger};
