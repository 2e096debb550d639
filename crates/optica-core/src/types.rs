//! # Domain Types
//!
//! Core domain types used throughout Optica.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │──►│    SaleItem     │   │   SalePayment   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  status         │   │  quantity       │   │  method         │       │
//! │  │  total_cents    │──►│  moves_stock    │   │  status         │       │
//! │  └────────┬────────┘   └─────────────────┘   └────────┬────────┘       │
//! │           │                                           │                 │
//! │           ▼                                           ▼                 │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Commission    │   │AccountReceivable│   │  CashMovement   │       │
//! │  │  PENDING ⇄      │   │  (store credit) │   │  IN / OUT       │       │
//! │  │  CANCELED       │   │  due_date       │   │  shift_id       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Referenced, not owned: Product, Customer, Seller, CashShift           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All identifiers are UUID v4 strings; all money columns are centavos.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage expressed in basis points (bps).
///
/// 1 basis point = 0.01%, so 500 bps = 5% (the default commission).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rate(u32);

impl Rate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Status Enums
// =============================================================================

/// Lifecycle status of a sale.
///
/// ```text
///            create
///              │
///              ▼
///        ┌───────────┐   cancel    ┌──────────┐
///        │ COMPLETED │ ──────────► │ CANCELED │
///        │           │ ◄────────── │          │
///        └───────────┘  reactivate └──────────┘
///              ▲
///              │ reactivate
///        ┌───────────┐
///        │ REFUNDED  │  (set by the refund flow)
///        └───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale is active: stock decremented, payments received.
    Completed,
    /// Sale was canceled; stock restored, payments voided.
    Canceled,
    /// Sale was refunded by the refund flow.
    Refunded,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Canceled => "canceled",
            SaleStatus::Refunded => "refunded",
        }
    }

    /// Only an active sale can be canceled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, SaleStatus::Completed)
    }

    pub fn can_reactivate(&self) -> bool {
        matches!(self, SaleStatus::Canceled | SaleStatus::Refunded)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SaleStatus::Completed)
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted payment method.
///
/// Requests carry the richer [`crate::request::Tender`]; this is what a
/// stored [`SalePayment`] and [`CashMovement`] record.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Pix,
    Debit,
    Credit,
    /// Crediário: settled later through receivable installments.
    StoreCredit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Credit => "credit",
            PaymentMethod::StoreCredit => "store_credit",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Received,
    Voided,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Open,
    Closed,
}

/// Direction of a cash-ledger entry.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementDirection {
    In,
    Out,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Canceled,
}

/// Status of a store-credit installment.
///
/// This engine only creates `Pending` rows; collections settle them.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceivableStatus {
    Pending,
    Paid,
}

/// Catalog item kind. Services (eye exams, frame adjustments) never move stock.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Product,
    Service,
}

/// Why a stock quantity changed.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockMovementReason {
    Sale,
    SaleCancel,
    SaleReactivate,
}

// =============================================================================
// Referenced Entities (catalog, registry)
// =============================================================================

/// A catalog item. Stock is mutated only through the stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub sku: String,
    pub name: String,
    pub kind: ProductKind,
    pub price_cents: i64,
    /// Unit cost, snapshotted on each sale item for margin reports.
    pub cost_cents: i64,
    /// On-hand quantity. May be negative only when not stock-controlled.
    pub stock_qty: i64,
    /// When false, sales may drive `stock_qty` below zero.
    pub stock_controlled: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Services are exempt from every stock operation.
    #[inline]
    pub fn moves_stock(&self) -> bool {
        self.kind != ProductKind::Service
    }

    /// Whether `quantity` units can leave stock right now.
    ///
    /// `allow_negative` is the store-wide override from configuration.
    pub fn can_sell(&self, quantity: i64, allow_negative: bool) -> bool {
        if !self.moves_stock() || !self.stock_controlled || allow_negative {
            return true;
        }
        self.stock_qty >= quantity
    }
}

/// A customer from the registry. Only credit fields matter here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    /// CPF/CNPJ.
    pub document: Option<String>,
    /// Store-credit ceiling. `None` means no limit is enforced.
    pub credit_limit_cents: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A seller profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Seller {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    /// Personal commission in bps; `None` falls back to the store default.
    pub commission_bps: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Seller {
    /// Returns the configured rate, ignoring values outside `0..=10000`.
    pub fn commission_rate(&self) -> Option<Rate> {
        self.commission_bps
            .and_then(|bps| u32::try_from(bps).ok())
            .filter(|bps| *bps <= 10_000)
            .map(Rate::from_bps)
    }
}

/// A branch-scoped register session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashShift {
    pub id: String,
    pub tenant_id: String,
    pub branch_id: String,
    pub status: ShiftStatus,
    pub opened_by: String,
    pub opening_balance_cents: i64,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Sale Aggregate
// =============================================================================

/// Sale header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    pub branch_id: String,
    pub customer_id: Option<String>,
    pub seller_id: String,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: SaleStatus,
    pub notes: Option<String>,
    /// Reason given at the most recent cancellation.
    pub cancel_reason: Option<String>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Order of the line within the sale.
    pub position: i64,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Unit cost at time of sale (frozen).
    pub unit_cost_cents: i64,
    pub discount_cents: i64,
    /// quantity × unit price − discount.
    pub line_total_cents: i64,
    /// Whether this line decremented stock (false for services).
    pub moves_stock: bool,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A payment towards a sale. Split tender is the norm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalePayment {
    pub id: String,
    pub sale_id: String,
    pub position: i64,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    /// Card or store-credit installment count (1 for cash/PIX/debit).
    pub installments: i64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SalePayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// A sale with its items and payments, as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<SalePayment>,
}

impl SaleDetail {
    /// Sum of every payment row, voided or not.
    pub fn payments_total(&self) -> Money {
        self.payments.iter().map(|p| p.amount()).sum()
    }
}

// =============================================================================
// Ledger Entries
// =============================================================================

/// `origin_type` of every cash movement written for a sale payment.
pub const ORIGIN_SALE_PAYMENT: &str = "sale_payment";

/// Append-only cash-ledger entry. Always traces back to a sale payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashMovement {
    pub id: String,
    pub tenant_id: String,
    pub shift_id: String,
    pub branch_id: String,
    pub direction: MovementDirection,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    /// [`ORIGIN_SALE_PAYMENT`] for entries written by the sale engine.
    pub origin_type: String,
    pub origin_id: String,
    pub actor_id: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A seller's commission on one sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Commission {
    pub id: String,
    pub tenant_id: String,
    pub seller_id: String,
    pub sale_id: String,
    pub base_cents: i64,
    pub rate_bps: i64,
    pub amount_cents: i64,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One store-credit installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AccountReceivable {
    pub id: String,
    pub tenant_id: String,
    pub customer_id: String,
    pub sale_id: String,
    pub payment_id: String,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    /// 1-based.
    pub installment_number: i64,
    pub installment_total: i64,
    pub status: ReceivableStatus,
    pub created_at: DateTime<Utc>,
}

/// Audit row for one stock-ledger adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    pub sale_id: Option<String>,
    pub quantity_delta: i64,
    pub resulting_qty: i64,
    pub reason: StockMovementReason,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Outbox
// =============================================================================

/// A sale lifecycle event queued for reporting/CRM consumers.
/// Written in the same transaction as the change it describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleOutboxEntry {
    pub id: String,
    pub tenant_id: String,
    /// `sale.created`, `sale.canceled` or `sale.reactivated`.
    pub event_type: String,
    pub sale_id: String,
    /// The full sale detail as JSON.
    pub payload: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub attempted_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(kind: ProductKind, stock_qty: i64, stock_controlled: bool) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            tenant_id: "t1".to_string(),
            sku: "ARM-001".to_string(),
            name: "Armação Acetato".to_string(),
            kind,
            price_cents: 29_900,
            cost_cents: 12_000,
            stock_qty,
            stock_controlled,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_rate_conversions() {
        let rate = Rate::from_bps(500);
        assert_eq!(rate.bps(), 500);
        assert!((rate.percentage() - 5.0).abs() < 0.001);
        assert_eq!(Rate::from_percentage(7.5).bps(), 750);
    }

    #[test]
    fn test_sale_status_transitions() {
        assert!(SaleStatus::Completed.can_cancel());
        assert!(!SaleStatus::Canceled.can_cancel());
        assert!(!SaleStatus::Refunded.can_cancel());

        assert!(SaleStatus::Canceled.can_reactivate());
        assert!(SaleStatus::Refunded.can_reactivate());
        assert!(!SaleStatus::Completed.can_reactivate());
    }

    #[test]
    fn test_can_sell_respects_stock_control() {
        assert!(product(ProductKind::Product, 2, true).can_sell(2, false));
        assert!(!product(ProductKind::Product, 1, true).can_sell(2, false));
        assert!(product(ProductKind::Product, 1, true).can_sell(2, true));
        assert!(product(ProductKind::Product, 0, false).can_sell(5, false));
        assert!(product(ProductKind::Service, 0, true).can_sell(1, false));
    }

    #[test]
    fn test_seller_commission_rate() {
        let mut seller = Seller {
            id: "s1".to_string(),
            tenant_id: "t1".to_string(),
            name: "Ana".to_string(),
            commission_bps: Some(300),
            is_active: true,
            created_at: Utc::now(),
        };
        assert_eq!(seller.commission_rate(), Some(Rate::from_bps(300)));

        seller.commission_bps = None;
        assert_eq!(seller.commission_rate(), None);

        seller.commission_bps = Some(-1);
        assert_eq!(seller.commission_rate(), None);
    }

    #[test]
    fn test_payment_method_serde_names() {
        let json = serde_json::to_string(&PaymentMethod::StoreCredit).unwrap();
        assert_eq!(json, "\"store_credit\"");
        assert_eq!(PaymentMethod::StoreCredit.to_string(), "store_credit");
    }
}
