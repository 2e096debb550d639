//! # Installment Scheduler
//!
//! Store-credit (crediário) policy: builds the receivable schedule and
//! decides whether a customer may take on more credit.
//!
//! ## Credit Check
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  customer.credit_limit = R$2.000,00                                    │
//! │  outstanding           = Σ PENDING installments, any sale status       │
//! │                        = R$1.500,00                                    │
//! │                                                                         │
//! │  request R$400,00  → 1.900 ≤ 2.000 → approved                          │
//! │  request R$600,00  → 2.100 > 2.000 → rejected, message names all three │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::config::InstallmentPolicy;
use crate::error::{SaleError, SaleResult};
use optica_core::installments::{self, Installment};
use optica_core::validation::validate_installment_count;
use optica_core::{InstallmentPlan, Money, TenantScope};
use optica_db::{CustomerRepository, ReceivableRepository};

/// Outcome of [`InstallmentScheduler::check_credit_limit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditDecision {
    pub approved: bool,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct InstallmentScheduler {
    policy: InstallmentPolicy,
    customers: CustomerRepository,
    receivables: ReceivableRepository,
}

impl InstallmentScheduler {
    pub fn new(
        policy: InstallmentPolicy,
        customers: CustomerRepository,
        receivables: ReceivableRepository,
    ) -> Self {
        InstallmentScheduler {
            policy,
            customers,
            receivables,
        }
    }

    /// Splits `amount` into `count` dated installments summing exactly to it.
    ///
    /// `interval_days` of `None` uses the configured default.
    pub fn schedule(
        &self,
        amount: Money,
        count: u32,
        first_due_date: NaiveDate,
        interval_days: Option<u32>,
    ) -> SaleResult<Vec<Installment>> {
        validate_installment_count(count, self.policy.max_installments)?;
        let interval = interval_days.unwrap_or(self.policy.default_interval_days);
        Ok(installments::schedule(amount, count, first_due_date, interval)?)
    }

    /// Schedule for one STORE_CREDIT tender.
    pub fn schedule_plan(&self, amount: Money, plan: &InstallmentPlan) -> SaleResult<Vec<Installment>> {
        self.schedule(amount, plan.installments, plan.first_due_date, plan.interval_days)
    }

    /// Decides whether `customer_id` may owe `amount` more.
    ///
    /// ## Errors
    /// `NotFound` when the customer is absent, inactive, or owned by another
    /// tenant.
    pub async fn check_credit_limit(
        &self,
        conn: &mut SqliteConnection,
        scope: &TenantScope,
        customer_id: &str,
        amount: Money,
    ) -> SaleResult<CreditDecision> {
        let customer = self
            .customers
            .find(&mut *conn, &scope.tenant_id, customer_id)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| SaleError::not_found("Customer", customer_id))?;

        let Some(limit) = customer.credit_limit_cents.map(Money::from_cents) else {
            return Ok(CreditDecision {
                approved: true,
                message: format!("{} has no credit limit", customer.name),
            });
        };

        let outstanding = Money::from_cents(
            self.receivables
                .outstanding_for_customer(&mut *conn, &scope.tenant_id, customer_id)
                .await?,
        );
        let exposure = outstanding
            .checked_add(amount)
            .ok_or_else(|| SaleError::Calculation("credit exposure overflow".to_string()))?;

        debug!(
            customer_id = %customer_id,
            limit = limit.cents(),
            outstanding = outstanding.cents(),
            requested = amount.cents(),
            "Credit limit check"
        );

        if exposure > limit {
            return Ok(CreditDecision {
                approved: false,
                message: format!(
                    "{} has a credit limit of {}, {} outstanding, {} requested",
                    customer.name, limit, outstanding, amount
                ),
            });
        }

        Ok(CreditDecision {
            approved: true,
            message: format!("{} available after this sale", limit - exposure),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use optica_core::Customer;
    use optica_db::{Database, DbConfig};

    fn scheduler(db: &Database) -> InstallmentScheduler {
        InstallmentScheduler::new(InstallmentPolicy::default(), db.customers(), db.receivables())
    }

    async fn customer(db: &Database, id: &str, limit: Option<i64>, active: bool) {
        db.customers()
            .insert(&Customer {
                id: id.to_string(),
                tenant_id: "t1".to_string(),
                name: "Maria Souza".to_string(),
                document: None,
                credit_limit_cents: limit,
                is_active: active,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_schedule_uses_default_interval() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = NaiveDate::from_ymd_opt(2026, 11, 10).unwrap();

        let plan = scheduler(&db)
            .schedule(Money::from_cents(10_000), 3, first, None)
            .unwrap();

        assert_eq!(plan[1].due_date, NaiveDate::from_ymd_opt(2026, 12, 10).unwrap());
        let sum: Money = plan.iter().map(|i| i.amount).sum();
        assert_eq!(sum.cents(), 10_000);
    }

    #[tokio::test]
    async fn test_schedule_rejects_count_above_max() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = NaiveDate::from_ymd_opt(2026, 11, 10).unwrap();

        let err = scheduler(&db)
            .schedule(Money::from_cents(100_000), 25, first, None)
            .unwrap_err();
        assert!(matches!(err, SaleError::Validation(_)));
    }

    #[tokio::test]
    async fn test_credit_limit_decisions() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        customer(&db, "limited", Some(50_000), true).await;
        customer(&db, "unlimited", None, true).await;
        customer(&db, "inactive", Some(50_000), false).await;

        let scope = TenantScope::new("t1", "u1");
        let scheduler = scheduler(&db);
        let mut conn = db.pool().acquire().await.unwrap();

        let ok = scheduler
            .check_credit_limit(&mut conn, &scope, "limited", Money::from_cents(50_000))
            .await
            .unwrap();
        assert!(ok.approved);

        let over = scheduler
            .check_credit_limit(&mut conn, &scope, "limited", Money::from_cents(50_001))
            .await
            .unwrap();
        assert!(!over.approved);
        assert!(over.message.contains("credit limit"));

        let free = scheduler
            .check_credit_limit(&mut conn, &scope, "unlimited", Money::from_cents(10_000_000))
            .await
            .unwrap();
        assert!(free.approved);

        let err = scheduler
            .check_credit_limit(&mut conn, &scope, "inactive", Money::from_cents(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::NotFound { .. }));

        let other_tenant = TenantScope::new("t2", "u1");
        let err = scheduler
            .check_credit_limit(&mut conn, &other_tenant, "limited", Money::from_cents(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::NotFound { .. }));
    }
}
