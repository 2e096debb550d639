//! # Sale Error Types
//!
//! What callers of the sale engine see.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌──────────────────┐  ┌────────────────────────┐ │
//! │  │  Client input   │  │  Business state  │  │  Infrastructure        │ │
//! │  │                 │  │                  │  │                        │ │
//! │  │  Validation     │  │  InsufficientStk │  │  Database              │ │
//! │  │  NotFound       │  │  NoOpenShift     │  │  ConfigLoadFailed      │ │
//! │  │  Forbidden      │  │  CreditLimitExc. │  │  ConfigSaveFailed      │ │
//! │  │                 │  │  InvalidStatus   │  │  InvalidConfig         │ │
//! │  └─────────────────┘  └──────────────────┘  └────────────────────────┘ │
//! │                                                                         │
//! │  Every variant aborts the enclosing transaction. Nothing is retried    │
//! │  inside the engine; `is_retryable()` tells the caller when a retry     │
//! │  with fresh input can succeed.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use optica_core::{CoreError, SaleStatus, ValidationError};
use optica_db::DbError;

/// Result type alias for sale operations.
pub type SaleResult<T> = Result<T, SaleError>;

/// Sale engine error type.
#[derive(Debug, Error)]
pub enum SaleError {
    // =========================================================================
    // Request Errors
    // =========================================================================
    /// The request is malformed: empty items or payments, payment-sum
    /// mismatch, STORE_CREDIT without a customer.
    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    /// Sale, product or customer absent, or owned by another tenant.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The request references another tenant's product.
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    // =========================================================================
    // Business State Errors
    // =========================================================================
    /// Not enough units on hand.
    ///
    /// ## When This Occurs
    /// - The precondition check finds too few units
    /// - A concurrent sale took the last unit first (the conditional update
    ///   matched no row)
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        product: String,
        available: i64,
        requested: i64,
    },

    /// No OPEN cash shift on the branch.
    #[error("No open cash shift for branch {branch_id}")]
    NoOpenShift { branch_id: String },

    /// The store-credit policy rejected the amount.
    #[error("Credit limit exceeded: {message}")]
    CreditLimitExceeded { message: String },

    /// The sale's status forbids the requested transition.
    #[error("Cannot {action} sale {sale_id} in status {status}")]
    InvalidStatus {
        sale_id: String,
        action: &'static str,
        status: SaleStatus,
    },

    // =========================================================================
    // Infrastructure Errors
    // =========================================================================
    /// Storage failure; the unit of work was rolled back.
    #[error("Database error: {0}")]
    Database(DbError),

    /// Arithmetic left the representable range.
    #[error("Calculation failed: {0}")]
    Calculation(String),

    #[error("Invalid sales configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

impl SaleError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        SaleError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True when the same request may succeed later.
    ///
    /// ## Retryable Errors
    /// - InsufficientStock (a concurrent sale won the race; retry with updated quantities)
    /// - Database lock held past the busy timeout, pool exhausted
    pub fn is_retryable(&self) -> bool {
        match self {
            SaleError::InsufficientStock { .. } => true,
            SaleError::Database(db) => db.is_busy(),
            _ => false,
        }
    }

    /// True when the caller sent something the engine will never accept as is.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SaleError::Validation(_)
                | SaleError::NotFound { .. }
                | SaleError::Forbidden { .. }
                | SaleError::InvalidStatus { .. }
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for SaleError {
    fn from(err: ValidationError) -> Self {
        SaleError::Validation(err)
    }
}

impl From<CoreError> for SaleError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => SaleError::Validation(v),
            CoreError::AmountOverflow { .. } => SaleError::Calculation(err.to_string()),
        }
    }
}

/// Storage errors that carry business meaning keep it.
///
/// ```text
/// DbError::InsufficientStock → SaleError::InsufficientStock
/// DbError::NotFound          → SaleError::NotFound
/// Other                      → SaleError::Database
/// ```
impl From<DbError> for SaleError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::InsufficientStock {
                product_id,
                name,
                available,
                requested,
            } => SaleError::InsufficientStock {
                product_id,
                product: name,
                available,
                requested,
            },
            DbError::NotFound { entity, id } => SaleError::NotFound { entity, id },
            other => SaleError::Database(other),
        }
    }
}

impl From<sqlx::Error> for SaleError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

impl From<serde_json::Error> for SaleError {
    fn from(err: serde_json::Error) -> Self {
        SaleError::Database(DbError::from(err))
    }
}

impl From<std::io::Error> for SaleError {
    fn from(err: std::io::Error) -> Self {
        SaleError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SaleError {
    fn from(err: toml::de::Error) -> Self {
        SaleError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SaleError {
    fn from(err: toml::ser::Error) -> Self {
        SaleError::ConfigSaveFailed(err.to_string())
    }
}
