//! # Validation Module
//!
//! Input validation for checkout requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request shape (serde)                                        │
//! │  └── STORE_CREDIT without a plan never deserializes                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE, before any transaction starts                   │
//! │  ├── quantities, prices, discounts                                     │
//! │  └── ids, installment counts, free text                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity > 0, amount > 0)                      │
//! │  └── Foreign keys, one open shift per branch                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of notes and cancel reasons.
pub const MAX_NOTE_LENGTH: usize = 500;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in centavos. Zero is allowed (courtesy items).
///
/// ## Example
/// ```rust
/// use optica_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount against the amount it applies to.
pub fn validate_discount(field: &str, cents: i64, max: i64) -> ValidationResult<()> {
    if cents < 0 || cents > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }

    Ok(())
}

/// Validates a store-credit installment count against the configured ceiling.
pub fn validate_installment_count(count: u32, max: u32) -> ValidationResult<()> {
    if count < 2 || count > max {
        return Err(ValidationError::OutOfRange {
            field: "installments".to_string(),
            min: 2,
            max: max as i64,
        });
    }

    Ok(())
}

/// Validates a card installment count (1 = à vista).
pub fn validate_card_installments(count: u32, max: u32) -> ValidationResult<()> {
    if count < 1 || count > max {
        return Err(ValidationError::OutOfRange {
            field: "card installments".to_string(),
            min: 1,
            max: max as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a sale.
pub fn validate_sale_size(items: usize) -> ValidationResult<()> {
    if items == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if items > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates optional free text (notes, cancel reasons).
///
/// ## Returns
/// The trimmed text, or `None` when blank.
pub fn validate_note(field: &str, text: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if text.chars().count() > MAX_NOTE_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NOTE_LENGTH,
        });
    }

    Ok(Some(text.to_string()))
}

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use optica_core::validation::validate_uuid;
///
/// assert!(validate_uuid("sale_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("sale_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates a required, non-blank identifier that need not be a UUID
/// (branch codes come from the branch registry as-is).
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount("discount", 0, 100).is_ok());
        assert!(validate_discount("discount", 100, 100).is_ok());
        assert!(validate_discount("discount", 101, 100).is_err());
        assert!(validate_discount("discount", -1, 100).is_err());
    }

    #[test]
    fn test_validate_installment_count() {
        assert!(validate_installment_count(2, 24).is_ok());
        assert!(validate_installment_count(24, 24).is_ok());
        assert!(validate_installment_count(1, 24).is_err());
        assert!(validate_installment_count(25, 24).is_err());

        assert!(validate_card_installments(1, 12).is_ok());
        assert!(validate_card_installments(0, 12).is_err());
    }

    #[test]
    fn test_validate_sale_size() {
        assert!(validate_sale_size(1).is_ok());
        assert!(validate_sale_size(0).is_err());
        assert!(validate_sale_size(MAX_SALE_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_note() {
        assert_eq!(validate_note("reason", None).unwrap(), None);
        assert_eq!(validate_note("reason", Some("   ")).unwrap(), None);
        assert_eq!(
            validate_note("reason", Some(" cliente desistiu ")).unwrap(),
            Some("cliente desistiu".to_string())
        );
        assert!(validate_note("reason", Some(&"x".repeat(MAX_NOTE_LENGTH + 1))).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }
}
