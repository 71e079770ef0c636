//! # Validation Module
//!
//! Input validation for the transactional core.
//!
//! ## Validation Strategy
//!
//! The request layer deserializes into the typed input structs
//! ([`crate::checkout::CreateSaleInput`] and friends) - there is no
//! open-ended payload anywhere. This module holds the field-level rules
//! those structs apply before the engine touches the store, and the
//! database adds NOT NULL / UNIQUE / CHECK constraints as the last line
//! of defense.
//!
//! ## Usage
//! ```rust
//! use arca_core::validation::{validate_product_code, validate_quantity};
//!
//! validate_product_code("COFFEE-250").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer reference.
///
/// The core treats the customer as an opaque reference supplied by the
/// caller; it only insists the reference is present and bounded.
pub fn validate_customer_id(customer_id: &str) -> ValidationResult<()> {
    let customer_id = customer_id.trim();

    if customer_id.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_id".to_string(),
        });
    }

    if customer_id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "customer_id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a quoted unit price in cents.
///
/// ## Rules
/// - Must be positive (> 0); a zero-priced line is rejected, discounts
///   are expressed at the sale level
pub fn validate_unit_price(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        });
    }

    Ok(())
}

/// Validates a sale-level discount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0); whether it exceeds the subtotal is a
///   pricing decision (InvalidTotal), not a field-format one
pub fn validate_discount(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a credit payment amount in cents.
///
/// ## Rules
/// - Must be positive (> 0); whether it exceeds the balance is a ledger
///   decision (Overpayment)
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates the number of lines in a sale.
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use arca_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("COFFEE-250").is_ok());
        assert!(validate_product_code("ABC123").is_ok());
        assert!(validate_product_code("product_1").is_ok());

        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code("has space").is_err());
        assert!(validate_product_code(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_customer_id() {
        assert!(validate_customer_id("cust-42").is_ok());
        assert!(validate_customer_id("").is_err());
        assert!(validate_customer_id(&"c".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(1).is_ok());
        assert!(validate_unit_price(1099).is_ok());
        assert!(validate_unit_price(0).is_err());
        assert!(validate_unit_price(-100).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(0).is_ok());
        assert!(validate_discount(500).is_ok());
        assert!(validate_discount(-1).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(4000).is_ok());
        assert!(validate_payment_amount(0).is_err());
        assert!(validate_payment_amount(-4000).is_err());
    }

    #[test]
    fn test_validate_item_count() {
        assert!(validate_item_count(1).is_ok());
        assert!(validate_item_count(100).is_ok());
        assert!(validate_item_count(0).is_err());
        assert!(validate_item_count(101).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
