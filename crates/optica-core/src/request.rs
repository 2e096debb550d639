//! # Checkout Requests
//!
//! Input types accepted by the sale engine.
//!
//! ## Tender Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  { "amount_cents": 30000, "method": "CASH" }                           │
//! │  { "amount_cents": 30000, "method": "CREDIT", "installments": 3 }      │
//! │  { "amount_cents": 60000, "method": "STORE_CREDIT",                    │
//! │    "installments": 4, "first_due_date": "2026-11-10" }                │
//! │                                                                         │
//! │  STORE_CREDIT cannot be built without an installment plan:             │
//! │  the payload is part of the variant, not an optional extra field.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::PaymentMethod;

/// Who is acting, and on behalf of which tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantScope {
    pub tenant_id: String,
    /// Recorded as the actor on every cash movement.
    pub user_id: String,
}

impl TenantScope {
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        TenantScope {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// One line of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemRequest {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
}

impl SaleItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64, unit_price_cents: i64) -> Self {
        SaleItemRequest {
            product_id: product_id.into(),
            quantity,
            unit_price_cents,
            discount_cents: 0,
        }
    }

    pub fn with_discount(mut self, discount_cents: i64) -> Self {
        self.discount_cents = discount_cents;
        self
    }
}

/// Store-credit (crediário) schedule requested at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    /// Number of installments, at least 2.
    pub installments: u32,
    pub first_due_date: NaiveDate,
    /// Days between due dates. `None` uses the configured default.
    #[serde(default)]
    pub interval_days: Option<u32>,
}

fn one_installment() -> u32 {
    1
}

/// How a payment was tendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tender {
    Cash,
    Pix,
    Debit,
    /// Card credit, optionally split by the acquirer.
    Credit {
        #[serde(default = "one_installment")]
        installments: u32,
    },
    StoreCredit(InstallmentPlan),
}

impl Tender {
    pub fn method(&self) -> PaymentMethod {
        match self {
            Tender::Cash => PaymentMethod::Cash,
            Tender::Pix => PaymentMethod::Pix,
            Tender::Debit => PaymentMethod::Debit,
            Tender::Credit { .. } => PaymentMethod::Credit,
            Tender::StoreCredit(_) => PaymentMethod::StoreCredit,
        }
    }

    /// Installment count persisted on the payment row.
    pub fn installments(&self) -> u32 {
        match self {
            Tender::Credit { installments } => *installments,
            Tender::StoreCredit(plan) => plan.installments,
            _ => 1,
        }
    }

    pub fn installment_plan(&self) -> Option<&InstallmentPlan> {
        match self {
            Tender::StoreCredit(plan) => Some(plan),
            _ => None,
        }
    }
}

/// One payment of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount_cents: i64,
    #[serde(flatten)]
    pub tender: Tender,
}

impl PaymentRequest {
    pub fn new(amount_cents: i64, tender: Tender) -> Self {
        PaymentRequest {
            amount_cents,
            tender,
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// A complete checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub branch_id: String,
    pub seller_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub items: Vec<SaleItemRequest>,
    pub payments: Vec<PaymentRequest>,
    /// Sale-level discount on top of line discounts.
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SaleRequest {
    /// Sum of all STORE_CREDIT payments.
    pub fn store_credit_total(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| p.tender.installment_plan().is_some())
            .map(|p| p.amount())
            .sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
