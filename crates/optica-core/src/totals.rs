//! # Sale Totals
//!
//! Pure checkout arithmetic: line totals, sale totals, and the
//! payment-sum check.
//!
//! ```text
//! line_total = quantity × unit_price − line_discount
//! subtotal   = Σ line_total
//! total      = subtotal − sale_discount
//! |Σ payments − total| ≤ tolerance
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::request::{PaymentRequest, SaleItemRequest};
use crate::validation::{validate_discount, validate_price_cents, validate_quantity};

/// Result of [`calculate_total`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

/// Computes one line's total after validating its inputs.
///
/// ## Example
/// ```rust
/// use optica_core::request::SaleItemRequest;
/// use optica_core::totals::line_total;
///
/// let item = SaleItemRequest::new("lens", 2, 45_000).with_discount(5_000);
/// assert_eq!(line_total(&item).unwrap().cents(), 85_000);
/// ```
pub fn line_total(item: &SaleItemRequest) -> CoreResult<Money> {
    validate_quantity(item.quantity)?;
    validate_price_cents(item.unit_price_cents)?;

    let gross = Money::from_cents(item.unit_price_cents)
        .checked_mul_quantity(item.quantity)
        .ok_or_else(|| CoreError::AmountOverflow {
            context: format!("line total for product {}", item.product_id),
        })?;

    validate_discount("line discount", item.discount_cents, gross.cents())?;

    Ok(gross - Money::from_cents(item.discount_cents))
}

/// Computes subtotal, discount and total for a set of items.
///
/// Pure and side-effect free: exposed to UI layers for live cart totals.
///
/// ## Errors
/// - `ValidationError::Required` when `items` is empty
/// - any item-level validation failure
/// - `OutOfRange` when the sale discount exceeds the subtotal
pub fn calculate_total(items: &[SaleItemRequest], discount_cents: i64) -> CoreResult<SaleTotals> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }

    let mut subtotal = Money::zero();
    for item in items {
        let line = line_total(item)?;
        subtotal = subtotal
            .checked_add(line)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: "sale subtotal".to_string(),
            })?;
    }

    validate_discount("discount", discount_cents, subtotal.cents())?;
    let discount = Money::from_cents(discount_cents);

    Ok(SaleTotals {
        subtotal,
        discount,
        total: subtotal - discount,
    })
}

/// Checks that payments cover `total` within `tolerance_cents`.
///
/// ## Example
/// ```rust
/// use optica_core::money::Money;
/// use optica_core::request::{PaymentRequest, Tender};
/// use optica_core::totals::check_payment_sum;
///
/// let payments = vec![
///     PaymentRequest::new(6_667, Tender::Pix),
///     PaymentRequest::new(3_332, Tender::Cash),
/// ];
/// // 99.99 against 100.00 is inside the 1-centavo tolerance
/// assert!(check_payment_sum(&payments, Money::from_cents(10_000), 1).is_ok());
/// ```
pub fn check_payment_sum(
    payments: &[PaymentRequest],
    total: Money,
    tolerance_cents: i64,
) -> Result<Money, ValidationError> {
    if payments.is_empty() {
        return Err(ValidationError::Required {
            field: "payments".to_string(),
        });
    }

    let mut paid = Money::zero();
    for payment in payments {
        if payment.amount_cents <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "payment amount".to_string(),
            });
        }
        paid = paid
            .checked_add(payment.amount())
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "payments".to_string(),
                min: 1,
                max: i64::MAX,
            })?;
    }

    if (paid - total).abs().cents() > tolerance_cents {
        return Err(ValidationError::PaymentMismatch { total, paid });
    }

    Ok(paid)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Tender;

    #[test]
    fn test_calculate_total_with_line_and_sale_discounts() {
        let items = vec![
            SaleItemRequest::new("frame", 1, 39_900).with_discount(4_900),
            SaleItemRequest::new("lens", 2, 25_000),
        ];

        let totals = calculate_total(&items, 5_000).unwrap();
        assert_eq!(totals.subtotal.cents(), 85_000);
        assert_eq!(totals.discount.cents(), 5_000);
        assert_eq!(totals.total.cents(), 80_000);
    }

    #[test]
    fn test_calculate_total_rejects_empty_items() {
        let err = calculate_total(&[], 0).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_calculate_total_rejects_bad_lines() {
        let zero_qty = vec![SaleItemRequest::new("p", 0, 100)];
        assert!(calculate_total(&zero_qty, 0).is_err());

        let negative_price = vec![SaleItemRequest::new("p", 1, -100)];
        assert!(calculate_total(&negative_price, 0).is_err());

        let oversized_discount = vec![SaleItemRequest::new("p", 1, 100).with_discount(101)];
        assert!(calculate_total(&oversized_discount, 0).is_err());
    }

    #[test]
    fn test_sale_discount_cannot_exceed_subtotal() {
        let items = vec![SaleItemRequest::new("p", 1, 1_000)];
        assert!(calculate_total(&items, 1_001).is_err());
        assert_eq!(calculate_total(&items, 1_000).unwrap().total.cents(), 0);
    }

    #[test]
    fn test_payment_sum_mismatch() {
        let payments = vec![PaymentRequest::new(15_000, Tender::Pix)];
        let err = check_payment_sum(&payments, Money::from_cents(20_000), 1).unwrap_err();
        assert!(matches!(err, ValidationError::PaymentMismatch { .. }));
    }

    #[test]
    fn test_payment_sum_tolerance_boundary() {
        let total = Money::from_cents(10_000);

        let within = vec![PaymentRequest::new(10_001, Tender::Cash)];
        assert_eq!(check_payment_sum(&within, total, 1).unwrap().cents(), 10_001);

        let outside = vec![PaymentRequest::new(10_002, Tender::Cash)];
        assert!(check_payment_sum(&outside, total, 1).is_err());
    }

    #[test]
    fn test_payment_sum_rejects_empty_and_non_positive() {
        assert!(matches!(
            check_payment_sum(&[], Money::from_cents(100), 1),
            Err(ValidationError::Required { .. })
        ));

        let zero = vec![PaymentRequest::new(0, Tender::Cash)];
        assert!(matches!(
            check_payment_sum(&zero, Money::zero(), 1),
            Err(ValidationError::MustBePositive { .. })
        ));
    }
}
