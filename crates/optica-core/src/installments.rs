//! # Installment Scheduling
//!
//! Expands a store-credit (crediário) amount into dated installments.
//!
//! ## Schedule Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  schedule(R$100.00, 3, 2026-11-10, 30)                                 │
//! │                                                                         │
//! │   #1  R$33.34  due 2026-11-10   ← remainder centavo lands here         │
//! │   #2  R$33.33  due 2026-12-10                                          │
//! │   #3  R$33.33  due 2027-01-09                                          │
//! │       ───────                                                           │
//! │       R$100.00  (always exact)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Intervals are calendar-day increments from the first due date.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

/// One dated installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// 1-based position in the plan.
    pub number: u32,
    pub total: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
}

/// Builds an installment schedule whose amounts sum exactly to `amount`.
///
/// ## Rules
/// - `count` must be at least 2
/// - every installment must be at least one centavo
/// - `interval_days` must be at least 1
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use optica_core::installments::schedule;
/// use optica_core::money::Money;
///
/// let first = NaiveDate::from_ymd_opt(2026, 11, 10).unwrap();
/// let plan = schedule(Money::from_cents(10_000), 3, first, 30).unwrap();
///
/// let amounts: Vec<i64> = plan.iter().map(|i| i.amount.cents()).collect();
/// assert_eq!(amounts, vec![3334, 3333, 3333]);
/// ```
pub fn schedule(
    amount: Money,
    count: u32,
    first_due_date: NaiveDate,
    interval_days: u32,
) -> CoreResult<Vec<Installment>> {
    if count < 2 {
        return Err(ValidationError::OutOfRange {
            field: "installments".to_string(),
            min: 2,
            max: u32::MAX as i64,
        }
        .into());
    }

    if interval_days == 0 {
        return Err(ValidationError::MustBePositive {
            field: "interval_days".to_string(),
        }
        .into());
    }

    if amount.cents() < count as i64 {
        return Err(ValidationError::OutOfRange {
            field: "store credit amount".to_string(),
            min: count as i64,
            max: i64::MAX,
        }
        .into());
    }

    amount
        .split(count)
        .into_iter()
        .enumerate()
        .map(|(index, share)| {
            let offset = index as u64 * interval_days as u64;
            let due_date = first_due_date
                .checked_add_days(Days::new(offset))
                .ok_or_else(|| CoreError::Validation(ValidationError::InvalidFormat {
                    field: "first_due_date".to_string(),
                    reason: "installment due date out of range".to_string(),
                }))?;

            Ok(Installment {
                number: index as u32 + 1,
                total: count,
                amount: share,
                due_date,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_schedule_sums_exactly() {
        let plan = schedule(Money::from_cents(10_000), 3, date(2026, 11, 10), 30).unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].amount.cents(), 3334);
        assert_eq!(plan[1].amount.cents(), 3333);
        assert_eq!(plan[2].amount.cents(), 3333);

        let sum: Money = plan.iter().map(|i| i.amount).sum();
        assert_eq!(sum.cents(), 10_000);
    }

    #[test]
    fn test_schedule_due_dates_use_calendar_days() {
        let plan = schedule(Money::from_cents(10_000), 3, date(2026, 11, 10), 30).unwrap();

        assert_eq!(plan[0].due_date, date(2026, 11, 10));
        assert_eq!(plan[1].due_date, date(2026, 12, 10));
        assert_eq!(plan[2].due_date, date(2027, 1, 9));
        assert_eq!(plan[2].number, 3);
        assert!(plan.iter().all(|i| i.total == 3));
    }

    #[test]
    fn test_schedule_rejects_single_installment() {
        assert!(schedule(Money::from_cents(10_000), 1, date(2026, 1, 1), 30).is_err());
        assert!(schedule(Money::from_cents(10_000), 0, date(2026, 1, 1), 30).is_err());
    }

    #[test]
    fn test_schedule_rejects_zero_interval_and_tiny_amounts() {
        assert!(schedule(Money::from_cents(10_000), 2, date(2026, 1, 1), 0).is_err());
        // 2 centavos cannot be split into 3 non-empty installments
        assert!(schedule(Money::from_cents(2), 3, date(2026, 1, 1), 30).is_err());
    }

    #[test]
    fn test_schedule_large_plan_keeps_sum() {
        let plan = schedule(Money::from_cents(123_457), 12, date(2026, 2, 28), 30).unwrap();
        let sum: Money = plan.iter().map(|i| i.amount).sum();
        assert_eq!(sum.cents(), 123_457);
        assert!(plan.windows(2).all(|w| w[0].due_date < w[1].due_date));
    }
}
