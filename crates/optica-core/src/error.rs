//! # Error Types
//!
//! Domain-specific error types for optica-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  optica-core errors (this file)                                        │
//! │  ├── CoreError        - Pure domain failures                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  optica-db errors                                                      │
//! │  └── DbError          - Storage failures, conditional-update misses    │
//! │                                                                         │
//! │  optica-sales errors                                                   │
//! │  └── SaleError        - What callers of the manager see                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                           DbError ──┴──► SaleError → caller            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Monetary arithmetic left the representable range.
    #[error("Amount overflow while computing {context}")]
    AmountOverflow { context: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any mutation runs; never retried automatically.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Payments do not cover the sale total.
    ///
    /// ## User Workflow
    /// ```text
    /// Items total R$200.00
    ///      │
    ///      ▼
    /// Payments: PIX R$150.00
    ///      │
    ///      ▼
    /// PaymentMismatch { total: R$200.00, paid: R$150.00 }
    ///      │
    ///      ▼
    /// UI shows: "Payments (R$150.00) do not match sale total (R$200.00)"
    /// ```
    #[error("Payments ({paid}) do not match sale total ({total})")]
    PaymentMismatch { total: Money, paid: Money },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
