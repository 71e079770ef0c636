//! # Error Types
//!
//! Domain-specific error types for arca-core.
//!
//! ## Error Hierarchy
//!
//! - `CoreError`        - business rule violations (this file)
//! - `ValidationError`  - input validation failures (this file)
//! - `DbError`          - database operation failures (arca-db)
//!
//! The request layer maps [`ErrorKind`] to transport status codes; the
//! core never does. Every error therefore carries both a stable
//! machine-readable kind and a human-readable message.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product code, credit id, etc.)
//! 3. Errors are enum variants, never String
//! 4. All checks that can run before a write run first; a mid-transaction
//!    failure rolls the whole unit back

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations or domain logic failures and
/// are translated by the request layer into transport responses.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced product code does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Credit does not exist.
    #[error("Credit not found: {0}")]
    CreditNotFound(String),

    /// Customer has no credit history at all.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Conditional stock debit found fewer units than requested.
    ///
    /// Raised by the zero-rows-affected result of the conditional
    /// decrement, so two concurrent sales can never both pass the check
    /// against the same unit of stock.
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// Discount exceeds the item subtotal.
    #[error("Sale total cannot be negative: {total_cents}")]
    InvalidTotal { total_cents: i64 },

    /// Void is terminal: the second attempt must observe failure,
    /// not a silent no-op.
    #[error("Sale {0} is already voided")]
    AlreadyVoided(String),

    /// A closed credit accepts no further payments.
    #[error("Credit {0} is already settled")]
    AlreadySettled(String),

    /// Payment amount exceeds the remaining balance.
    #[error("Payment of {requested_cents} exceeds remaining balance {balance_cents}")]
    Overpayment {
        requested_cents: i64,
        balance_cents: i64,
    },

    /// A concurrent writer got there first (lost balance race,
    /// credit with recorded payments blocking a cancellation, ...).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Stable machine-readable kind for the request layer to map to a
    /// transport status. Never changes for a given variant.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::CreditNotFound(_)
            | CoreError::CustomerNotFound(_) => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::InvalidTotal { .. } => ErrorKind::InvalidTotal,
            CoreError::AlreadyVoided(_) | CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::AlreadySettled(_) => ErrorKind::AlreadySettled,
            CoreError::Overpayment { .. } => ErrorKind::Overpayment,
            CoreError::Validation(_) => ErrorKind::ValidationError,
        }
    }
}

/// Machine-readable error kinds.
///
/// ## Usage in the request layer
/// The transport maps kinds to status codes (NotFound -> 404,
/// ValidationError -> 400, Conflict -> 409, ...). The core only promises
/// the kind is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    ValidationError,
    InsufficientStock,
    InvalidTotal,
    Conflict,
    AlreadySettled,
    Overpayment,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when request input does not meet requirements.
/// Used for early validation before any write happens.
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

    /// Invalid format (e.g. invalid UUID, invalid product code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "COFFEE-250".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for COFFEE-250: available 3, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(
            CoreError::ProductNotFound("X".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::AlreadyVoided("s1".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            CoreError::AlreadySettled("c1".into()).kind(),
            ErrorKind::AlreadySettled
        );
        assert_eq!(
            CoreError::Overpayment {
                requested_cents: 100,
                balance_cents: 50
            }
            .kind(),
            ErrorKind::Overpayment
        );
        assert_eq!(
            CoreError::InvalidTotal { total_cents: -1 }.kind(),
            ErrorKind::InvalidTotal
        );
    }
}
