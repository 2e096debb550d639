//! # optica-core: Pure Business Logic for Optica
//!
//! Everything the sale engine can decide without touching storage:
//! money math, totals, installment schedules, commission quotes, and input
//! validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Optica Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          UI / report / CRM collaborators (out of tree)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      optica-sales: SaleTransactionManager, CashShiftGate        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ optica-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────────┐ ┌───────┐ │   │
//! │  │  │  types  │ │  money  │ │  totals  │ │installments│ │commis-│ │   │
//! │  │  │  Sale   │ │  Money  │ │ Sale     │ │ schedule   │ │ sion  │ │   │
//! │  │  │ Payment │ │  split  │ │ Totals   │ │            │ │       │ │   │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └────────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    optica-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, SalePayment, CashMovement, etc.)
//! - [`request`] - Checkout request types and the `Tender` variant
//! - [`money`] - Money type with integer arithmetic
//! - [`totals`] - Sale totals and payment-sum check
//! - [`installments`] - Store-credit installment schedules
//! - [`commission`] - Commission quotes
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use optica_core::request::SaleItemRequest;
//! use optica_core::totals::calculate_total;
//!
//! let items = vec![
//!     SaleItemRequest::new("frame", 1, 39_900),
//!     SaleItemRequest::new("lens", 2, 25_000),
//! ];
//! let totals = calculate_total(&items, 4_900).unwrap();
//! assert_eq!(totals.total.cents(), 85_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commission;
pub mod error;
pub mod installments;
pub mod money;
pub mod request;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use commission::{CommissionCalculator, CommissionQuote};
pub use error::{CoreError, CoreResult, ValidationError};
pub use installments::Installment;
pub use money::Money;
pub use request::{InstallmentPlan, PaymentRequest, SaleItemRequest, SaleRequest, TenantScope, Tender};
pub use totals::SaleTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Demo tenant used by the seed binary.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum lines in a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity on one line.
///
/// ## Business Reason
/// Catches typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Fallback commission when a seller has no personal rate (5%).
pub const DEFAULT_COMMISSION_BPS: u32 = 500;

/// Allowed gap between Σ payments and the sale total (one centavo).
pub const PAYMENT_TOLERANCE_CENTS: i64 = 1;

/// Default days between store-credit due dates.
pub const DEFAULT_INSTALLMENT_INTERVAL_DAYS: u32 = 30;

/// Default ceiling for store-credit and card installments.
pub const MAX_INSTALLMENTS: u32 = 24;
