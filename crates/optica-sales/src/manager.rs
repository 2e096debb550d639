//! # Sale Transaction Manager
//!
//! Orchestrates the sale lifecycle. Each public operation is one
//! `BEGIN IMMEDIATE` unit of work; the `*_in` variants run the same steps on
//! a connection the caller already holds inside a transaction.
//!
//! ## State Machine
//! ```text
//!            create
//!              │
//!              ▼
//!        ┌───────────┐   cancel    ┌──────────┐
//!        │ COMPLETED │ ──────────► │ CANCELED │
//!        │           │ ◄────────── │          │
//!        └───────────┘  reactivate └──────────┘
//!              ▲
//!              │ reactivate
//!        ┌───────────┐
//!        │ REFUNDED  │
//!        └───────────┘
//! ```
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate request (pure)  items, payments, Σ payments ≈ total          │
//! │          │                                                              │
//! │  BEGIN IMMEDIATE                                                        │
//! │          │                                                              │
//! │  preconditions            products, stock, credit limit, open shift    │
//! │          │                                                              │
//! │  sale ─► items ─► stock (sorted by product id) ─► payments + IN cash   │
//! │       ─► receivables ─► commission ─► outbox event                     │
//! │          │                                                              │
//! │  COMMIT  (any error drops the transaction: nothing persists)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cancel / Reactivate Asymmetry
//! Cancel voids RECEIVED payments and writes OUT movements only when the
//! branch has an open shift. Reactivate demands an open shift, writes one IN
//! movement per payment row, and leaves the payment rows VOIDED.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SalesConfig;
use crate::error::{SaleError, SaleResult};
use crate::gate::CashShiftGate;
use crate::installments::InstallmentScheduler;
use optica_core::installments::Installment;
use optica_core::totals::{calculate_total, check_payment_sum};
use optica_core::validation::{
    validate_card_installments, validate_note, validate_required, validate_sale_size,
};
use optica_core::{
    AccountReceivable, CashMovement, CashShift, Commission, CommissionCalculator, CommissionStatus,
    MovementDirection, PaymentStatus, Product, ReceivableStatus, Sale, SaleDetail, SaleItem,
    SaleItemRequest, SalePayment, SaleRequest, SaleStatus, SaleTotals, StockMovementReason,
    TenantScope, Tender, ValidationError, ORIGIN_SALE_PAYMENT,
};
use optica_db::{events, Database, StockAdjustment};

/// A request that passed every check not needing the database.
struct ValidatedSale {
    totals: SaleTotals,
    notes: Option<String>,
    /// One entry per payment, `Some` for STORE_CREDIT.
    schedules: Vec<Option<Vec<Installment>>>,
}

/// Entry point for creating, canceling and reactivating sales.
///
/// ## Usage
/// ```rust,ignore
/// let manager = SaleTransactionManager::new(db, SalesConfig::load_or_default(None));
/// let detail = manager.create(&scope, &request).await?;
/// manager.cancel(&scope, &detail.sale.id, Some("cliente desistiu")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleTransactionManager {
    db: Database,
    config: SalesConfig,
    gate: CashShiftGate,
    scheduler: InstallmentScheduler,
    commissions: CommissionCalculator,
}

impl SaleTransactionManager {
    pub fn new(db: Database, config: SalesConfig) -> Self {
        let gate = CashShiftGate::new(db.shifts());
        let scheduler = InstallmentScheduler::new(
            config.installments.clone(),
            db.customers(),
            db.receivables(),
        );
        let commissions = config.commission_calculator();

        SaleTransactionManager {
            db,
            config,
            gate,
            scheduler,
            commissions,
        }
    }

    pub fn config(&self) -> &SalesConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &InstallmentScheduler {
        &self.scheduler
    }

    /// Live cart totals. No side effects.
    pub fn calculate_total(&self, items: &[SaleItemRequest], discount_cents: i64) -> SaleResult<SaleTotals> {
        Ok(calculate_total(items, discount_cents)?)
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Records a completed sale.
    ///
    /// ## Errors
    /// - `Validation` for malformed requests (nothing is read or written)
    /// - `NotFound` / `Forbidden` for unknown or foreign products
    /// - `InsufficientStock`, `CreditLimitExceeded`, `NoOpenShift`
    pub async fn create(&self, scope: &TenantScope, request: &SaleRequest) -> SaleResult<SaleDetail> {
        let mut tx = self.db.begin_immediate().await?;
        let detail = self.create_in(&mut *tx, scope, request).await?;
        tx.commit().await?;

        info!(
            sale_id = %detail.sale.id,
            tenant_id = %scope.tenant_id,
            total = detail.sale.total_cents,
            items = detail.items.len(),
            payments = detail.payments.len(),
            "Sale created"
        );
        Ok(detail)
    }

    /// [`Self::create`] on a connection already inside a transaction.
    pub async fn create_in(
        &self,
        conn: &mut SqliteConnection,
        scope: &TenantScope,
        request: &SaleRequest,
    ) -> SaleResult<SaleDetail> {
        let validated = self.validate_request(request)?;
        let quantities = aggregate_quantities(
            request
                .items
                .iter()
                .map(|item| (item.product_id.as_str(), item.quantity)),
        );

        // ---- preconditions: no writes before this point is passed ----

        let mut products: BTreeMap<&str, Product> = BTreeMap::new();
        for (&product_id, &quantity) in &quantities {
            let product = self.load_sellable_product(&mut *conn, scope, product_id).await?;
            if product.moves_stock() && !product.can_sell(quantity, self.config.sales.allow_negative_stock) {
                return Err(insufficient(&product, quantity));
            }
            products.insert(product_id, product);
        }

        if let Some(customer_id) = request.customer_id.as_deref() {
            self.db
                .customers()
                .find(&mut *conn, &scope.tenant_id, customer_id)
                .await?
                .filter(|customer| customer.is_active)
                .ok_or_else(|| SaleError::not_found("Customer", customer_id))?;
        }

        let store_credit = request.store_credit_total();
        if !store_credit.is_zero() {
            let customer_id = request
                .customer_id
                .as_deref()
                .ok_or_else(|| ValidationError::Required {
                    field: "customer_id".to_string(),
                })?;
            let decision = self
                .scheduler
                .check_credit_limit(&mut *conn, scope, customer_id, store_credit)
                .await?;
            if !decision.approved {
                return Err(SaleError::CreditLimitExceeded {
                    message: decision.message,
                });
            }
        }

        let seller_rate = match self
            .db
            .sellers()
            .find(&mut *conn, &scope.tenant_id, &request.seller_id)
            .await?
        {
            Some(seller) => seller.commission_rate(),
            None => {
                warn!(
                    seller_id = %request.seller_id,
                    fallback_bps = self.commissions.fallback().bps(),
                    "Seller not in registry, using fallback commission"
                );
                None
            }
        };

        let shift = self
            .gate
            .require_open_shift(&mut *conn, &scope.tenant_id, &request.branch_id)
            .await?;

        // ---- mutations ----

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            tenant_id: scope.tenant_id.clone(),
            branch_id: request.branch_id.clone(),
            customer_id: request.customer_id.clone(),
            seller_id: request.seller_id.clone(),
            subtotal_cents: validated.totals.subtotal.cents(),
            discount_cents: validated.totals.discount.cents(),
            total_cents: validated.totals.total.cents(),
            status: SaleStatus::Completed,
            notes: validated.notes,
            cancel_reason: None,
            canceled_at: None,
            created_at: now,
            updated_at: now,
        };
        let sales = self.db.sales();
        sales.insert_sale(&mut *conn, &sale).await?;

        for (position, line) in request.items.iter().enumerate() {
            let product = products
                .get(line.product_id.as_str())
                .ok_or_else(|| SaleError::not_found("Product", &line.product_id))?;
            let line_total = optica_core::totals::line_total(line)?;

            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: product.id.clone(),
                position: position as i64,
                name_snapshot: product.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                unit_cost_cents: product.cost_cents,
                discount_cents: line.discount_cents,
                line_total_cents: line_total.cents(),
                moves_stock: product.moves_stock(),
                created_at: now,
            };
            sales.insert_item(&mut *conn, &item).await?;
        }

        let stock = self.db.stock();
        for (&product_id, &quantity) in &quantities {
            let Some(product) = products.get(product_id) else {
                continue;
            };
            if !product.moves_stock() {
                continue;
            }
            let remaining = stock
                .adjust(
                    &mut *conn,
                    StockAdjustment {
                        tenant_id: &scope.tenant_id,
                        product_id,
                        delta: -quantity,
                        allow_negative: !product.stock_controlled
                            || self.config.sales.allow_negative_stock,
                        reason: StockMovementReason::Sale,
                        sale_id: Some(&sale.id),
                    },
                )
                .await?;
            debug!(product_id = %product_id, quantity, remaining, "Stock decremented");
        }

        let receivables = self.db.receivables();
        for (position, (payment_request, schedule)) in request
            .payments
            .iter()
            .zip(validated.schedules.iter())
            .enumerate()
        {
            let payment = SalePayment {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                position: position as i64,
                method: payment_request.tender.method(),
                amount_cents: payment_request.amount_cents,
                installments: payment_request.tender.installments() as i64,
                status: PaymentStatus::Received,
                created_at: now,
                updated_at: now,
            };
            sales.insert_payment(&mut *conn, &payment).await?;
            self.record_movement(
                &mut *conn,
                scope,
                &shift,
                &payment,
                MovementDirection::In,
                format!("Sale {}", sale.id),
            )
            .await?;

            if let (Some(schedule), Some(customer_id)) = (schedule, sale.customer_id.as_deref()) {
                for installment in schedule {
                    let receivable = AccountReceivable {
                        id: Uuid::new_v4().to_string(),
                        tenant_id: scope.tenant_id.clone(),
                        customer_id: customer_id.to_string(),
                        sale_id: sale.id.clone(),
                        payment_id: payment.id.clone(),
                        amount_cents: installment.amount.cents(),
                        due_date: installment.due_date,
                        installment_number: installment.number as i64,
                        installment_total: installment.total as i64,
                        status: ReceivableStatus::Pending,
                        created_at: now,
                    };
                    receivables.insert(&mut *conn, &receivable).await?;
                }
            }
        }

        let quote = self.commissions.compute(seller_rate, validated.totals.total);
        let commission = Commission {
            id: Uuid::new_v4().to_string(),
            tenant_id: scope.tenant_id.clone(),
            seller_id: sale.seller_id.clone(),
            sale_id: sale.id.clone(),
            base_cents: quote.base.cents(),
            rate_bps: quote.rate.bps() as i64,
            amount_cents: quote.amount.cents(),
            status: CommissionStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.db.commissions().insert(&mut *conn, &commission).await?;

        self.finish(conn, scope, &sale.id, events::SALE_CREATED).await
    }

    // =========================================================================
    // Cancel
    // =========================================================================

    /// COMPLETED → CANCELED. Restores stock, voids payments, cancels the
    /// commission.
    pub async fn cancel(
        &self,
        scope: &TenantScope,
        sale_id: &str,
        reason: Option<&str>,
    ) -> SaleResult<SaleDetail> {
        let mut tx = self.db.begin_immediate().await?;
        let detail = self.cancel_in(&mut *tx, scope, sale_id, reason).await?;
        tx.commit().await?;

        info!(sale_id = %sale_id, tenant_id = %scope.tenant_id, "Sale canceled");
        Ok(detail)
    }

    pub async fn cancel_in(
        &self,
        conn: &mut SqliteConnection,
        scope: &TenantScope,
        sale_id: &str,
        reason: Option<&str>,
    ) -> SaleResult<SaleDetail> {
        let reason = validate_note("reason", reason)?;
        let sales = self.db.sales();

        let sale = sales
            .find_sale(&mut *conn, &scope.tenant_id, sale_id)
            .await?
            .ok_or_else(|| SaleError::not_found("Sale", sale_id))?;
        if !sale.status.can_cancel() {
            return Err(SaleError::InvalidStatus {
                sale_id: sale.id,
                action: "cancel",
                status: sale.status,
            });
        }

        let items = sales.find_items(&mut *conn, sale_id).await?;
        let payments = sales.find_payments(&mut *conn, sale_id).await?;
        let shift = self
            .gate
            .find_open_shift(&mut *conn, &scope.tenant_id, &sale.branch_id)
            .await?;

        sales
            .mark_canceled(&mut *conn, sale_id, reason.as_deref(), Utc::now())
            .await?;

        // Unconditional restore: whatever the product's flags are now.
        let stock = self.db.stock();
        for (product_id, quantity) in stocked_quantities(&items) {
            stock
                .adjust(
                    &mut *conn,
                    StockAdjustment {
                        tenant_id: &scope.tenant_id,
                        product_id,
                        delta: quantity,
                        allow_negative: true,
                        reason: StockMovementReason::SaleCancel,
                        sale_id: Some(sale_id),
                    },
                )
                .await?;
        }

        for payment in payments.iter().filter(|p| p.status == PaymentStatus::Received) {
            sales
                .set_payment_status(&mut *conn, &payment.id, PaymentStatus::Voided)
                .await?;

            match &shift {
                Some(shift) => {
                    self.record_movement(
                        &mut *conn,
                        scope,
                        shift,
                        payment,
                        MovementDirection::Out,
                        format!("Sale {} canceled", sale_id),
                    )
                    .await?;
                }
                None => warn!(
                    sale_id = %sale_id,
                    payment_id = %payment.id,
                    branch_id = %sale.branch_id,
                    amount = payment.amount_cents,
                    "No open cash shift, skipping reversing cash movement"
                ),
            }
        }

        self.db
            .commissions()
            .transition_for_sale(&mut *conn, sale_id, CommissionStatus::Pending, CommissionStatus::Canceled)
            .await?;

        self.finish(conn, scope, sale_id, events::SALE_CANCELED).await
    }

    // =========================================================================
    // Reactivate
    // =========================================================================

    /// CANCELED/REFUNDED → COMPLETED. Takes stock again and re-enters every
    /// payment into the current shift.
    pub async fn reactivate(&self, scope: &TenantScope, sale_id: &str) -> SaleResult<SaleDetail> {
        let mut tx = self.db.begin_immediate().await?;
        let detail = self.reactivate_in(&mut *tx, scope, sale_id).await?;
        tx.commit().await?;

        info!(sale_id = %sale_id, tenant_id = %scope.tenant_id, "Sale reactivated");
        Ok(detail)
    }

    pub async fn reactivate_in(
        &self,
        conn: &mut SqliteConnection,
        scope: &TenantScope,
        sale_id: &str,
    ) -> SaleResult<SaleDetail> {
        let sales = self.db.sales();

        let sale = sales
            .find_sale(&mut *conn, &scope.tenant_id, sale_id)
            .await?
            .ok_or_else(|| SaleError::not_found("Sale", sale_id))?;
        if !sale.status.can_reactivate() {
            return Err(SaleError::InvalidStatus {
                sale_id: sale.id,
                action: "reactivate",
                status: sale.status,
            });
        }

        let items = sales.find_items(&mut *conn, sale_id).await?;
        let quantities = stocked_quantities(&items);
        let allow_negative = self.config.sales.allow_negative_stock;

        let products = self.db.products();
        let mut stock_controlled: BTreeMap<&str, bool> = BTreeMap::new();
        for (&product_id, &quantity) in &quantities {
            let product = products
                .find(&mut *conn, product_id)
                .await?
                .filter(|p| p.tenant_id == scope.tenant_id)
                .ok_or_else(|| SaleError::not_found("Product", product_id))?;
            if !product.can_sell(quantity, allow_negative) {
                return Err(insufficient(&product, quantity));
            }
            stock_controlled.insert(product_id, product.stock_controlled);
        }

        let shift = self
            .gate
            .require_open_shift(&mut *conn, &scope.tenant_id, &sale.branch_id)
            .await?;

        let stock = self.db.stock();
        for (&product_id, &quantity) in &quantities {
            let controlled = stock_controlled.get(product_id).copied().unwrap_or(true);
            stock
                .adjust(
                    &mut *conn,
                    StockAdjustment {
                        tenant_id: &scope.tenant_id,
                        product_id,
                        delta: -quantity,
                        allow_negative: !controlled || allow_negative,
                        reason: StockMovementReason::SaleReactivate,
                        sale_id: Some(sale_id),
                    },
                )
                .await?;
        }

        sales.mark_completed(&mut *conn, sale_id, Utc::now()).await?;

        // Payment rows keep their status; only the ledger gains entries.
        let payments = sales.find_payments(&mut *conn, sale_id).await?;
        for payment in &payments {
            self.record_movement(
                &mut *conn,
                scope,
                &shift,
                payment,
                MovementDirection::In,
                format!("Sale {} reactivated", sale_id),
            )
            .await?;
        }

        self.db
            .commissions()
            .transition_for_sale(&mut *conn, sale_id, CommissionStatus::Canceled, CommissionStatus::Pending)
            .await?;

        self.finish(conn, scope, sale_id, events::SALE_REACTIVATED).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Loads a sale with its items and payments.
    ///
    /// With `include_inactive = false` only COMPLETED sales are found.
    pub async fn get_by_id(
        &self,
        scope: &TenantScope,
        sale_id: &str,
        include_inactive: bool,
    ) -> SaleResult<SaleDetail> {
        self.db
            .sales()
            .get_detail(&scope.tenant_id, sale_id)
            .await?
            .filter(|detail| include_inactive || detail.sale.status.is_active())
            .ok_or_else(|| SaleError::not_found("Sale", sale_id))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn validate_request(&self, request: &SaleRequest) -> SaleResult<ValidatedSale> {
        validate_required("branch_id", &request.branch_id)?;
        validate_required("seller_id", &request.seller_id)?;
        validate_sale_size(request.items.len())?;
        for item in &request.items {
            validate_required("product_id", &item.product_id)?;
        }

        let totals = calculate_total(&request.items, request.discount_cents)?;
        check_payment_sum(
            &request.payments,
            totals.total,
            self.config.sales.payment_tolerance_cents,
        )?;

        let max_installments = self.config.installments.max_installments;
        let mut schedules = Vec::with_capacity(request.payments.len());
        for payment in &request.payments {
            let schedule = match &payment.tender {
                Tender::Credit { installments } => {
                    validate_card_installments(*installments, max_installments)?;
                    None
                }
                Tender::StoreCredit(plan) => {
                    if request.customer_id.is_none() {
                        return Err(ValidationError::Required {
                            field: "customer_id".to_string(),
                        }
                        .into());
                    }
                    Some(self.scheduler.schedule_plan(payment.amount(), plan)?)
                }
                Tender::Cash | Tender::Pix | Tender::Debit => None,
            };
            schedules.push(schedule);
        }

        let notes = validate_note("notes", request.notes.as_deref())?;

        Ok(ValidatedSale {
            totals,
            notes,
            schedules,
        })
    }

    /// A product referenced by a checkout line.
    ///
    /// Another tenant's product is `Forbidden`, not `NotFound`.
    async fn load_sellable_product(
        &self,
        conn: &mut SqliteConnection,
        scope: &TenantScope,
        product_id: &str,
    ) -> SaleResult<Product> {
        let product = self
            .db
            .products()
            .find(conn, product_id)
            .await?
            .ok_or_else(|| SaleError::not_found("Product", product_id))?;

        if product.tenant_id != scope.tenant_id {
            return Err(SaleError::Forbidden {
                message: format!("product {} belongs to another tenant", product_id),
            });
        }
        if !product.is_active {
            return Err(SaleError::not_found("Product", product_id));
        }

        Ok(product)
    }

    async fn record_movement(
        &self,
        conn: &mut SqliteConnection,
        scope: &TenantScope,
        shift: &CashShift,
        payment: &SalePayment,
        direction: MovementDirection,
        note: String,
    ) -> SaleResult<()> {
        let movement = CashMovement {
            id: Uuid::new_v4().to_string(),
            tenant_id: scope.tenant_id.clone(),
            shift_id: shift.id.clone(),
            branch_id: shift.branch_id.clone(),
            direction,
            method: payment.method,
            amount_cents: payment.amount_cents,
            origin_type: ORIGIN_SALE_PAYMENT.to_string(),
            origin_id: payment.id.clone(),
            actor_id: scope.user_id.clone(),
            note: Some(note),
            created_at: Utc::now(),
        };
        self.db.cash_movements().insert(conn, &movement).await?;
        Ok(())
    }

    /// Reloads the sale inside the transaction and queues its event.
    async fn finish(
        &self,
        conn: &mut SqliteConnection,
        scope: &TenantScope,
        sale_id: &str,
        event_type: &str,
    ) -> SaleResult<SaleDetail> {
        let detail = self
            .db
            .sales()
            .load_detail(&mut *conn, &scope.tenant_id, sale_id)
            .await?
            .ok_or_else(|| SaleError::not_found("Sale", sale_id))?;

        let payload = serde_json::to_string(&detail)?;
        self.db
            .outbox()
            .enqueue(&mut *conn, &scope.tenant_id, event_type, sale_id, &payload)
            .await?;

        Ok(detail)
    }
}

/// Sums quantities per product. Iteration order is ascending product id,
/// which is the lock order for stock updates.
fn aggregate_quantities<'a>(lines: impl Iterator<Item = (&'a str, i64)>) -> BTreeMap<&'a str, i64> {
    let mut totals = BTreeMap::new();
    for (product_id, quantity) in lines {
        *totals.entry(product_id).or_insert(0) += quantity;
    }
    totals
}

/// Quantities of the lines that moved stock when the sale was created.
fn stocked_quantities(items: &[SaleItem]) -> BTreeMap<&str, i64> {
    aggregate_quantities(
        items
            .iter()
            .filter(|item| item.moves_stock)
            .map(|item| (item.product_id.as_str(), item.quantity)),
    )
}

fn insufficient(product: &Product, requested: i64) -> SaleError {
    SaleError::InsufficientStock {
        product_id: product.id.clone(),
        product: product.name.clone(),
        available: product.stock_qty,
        requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_quantities_sorted_by_product() {
        let lines = vec![("p-b", 1), ("p-a", 2), ("p-b", 3)];
        let totals = aggregate_quantities(lines.into_iter());

        let ordered: Vec<(&str, i64)> = totals.into_iter().collect();
        assert_eq!(ordered, vec![("p-a", 2), ("p-b", 4)]);
    }
}
