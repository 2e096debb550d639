//! # optica-sales: Sale Transaction Engine for Optica
//!
//! Creates, cancels and reactivates sales so that stock, payments, the cash
//! ledger, store-credit receivables and seller commissions change together
//! or not at all.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI / report / CRM collaborators                                       │
//! │       │  create / cancel / reactivate / get_by_id / calculate_total    │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 optica-sales (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │  SaleTransactionManager ──► CashShiftGate                      │   │
//! │  │          │              ──► InstallmentScheduler               │   │
//! │  │          │              ──► CommissionCalculator (core)        │   │
//! │  │          ▼                                                      │   │
//! │  │  one BEGIN IMMEDIATE transaction per operation                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  optica-db repositories ──► SQLite                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use optica_db::Database;
//! use optica_sales::{SaleTransactionManager, SalesConfig};
//!
//! let config = SalesConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//! let manager = SaleTransactionManager::new(db, config);
//!
//! let detail = manager.create(&scope, &request).await?;
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod installments;
pub mod manager;


pub use config::{DatabaseSettings, InstallmentPolicy, SalePolicy, SalesConfig};
pub use error::{SaleError, SaleResult};
pub use gate::CashShiftGate;
pub use installments::{CreditDecision, InstallmentScheduler};
pub use manager::SaleTransactionManager;
