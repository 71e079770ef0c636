//! # Checkout Module
//!
//! Pure sale pricing and the typed sale input.
//!
//! ## Pricing Rules
//!
//! - line subtotal = quantity x quoted unit price
//! - sale subtotal = sum of line subtotals
//! - sale total = subtotal - discount, and a negative total is rejected
//!
//! The quoted unit price travels with the request and is frozen onto the
//! sale item; a later catalog price change never rewrites a sale.
//!
//! ## Input Shape
//!
//! [`CreateSaleInput`] is the explicit, statically validated boundary
//! structure: the engine never accepts an open-ended mapping. A sale paid
//! with [`PaymentMethod::Credit`] must carry [`CreditTerms`]; any other
//! method must not.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::validation::{
    validate_customer_id, validate_discount, validate_item_count, validate_product_code,
    validate_quantity, validate_unit_price,
};

// =============================================================================
// Input Types
// =============================================================================

/// One requested sale line: a product code, how many, and the quoted
/// unit price in cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineInput {
    pub code: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl SaleLineInput {
    /// Line subtotal (quantity x quoted unit price).
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// Credit terms for a sale paid with store credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTerms {
    pub customer_id: String,
    pub due_date: NaiveDate,
}

/// Validated input for creating a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleInput {
    pub items: Vec<SaleLineInput>,
    pub payment_method: PaymentMethod,
    pub discount_cents: i64,
    pub store_id: Option<String>,
    pub user_id: Option<String>,
    /// Present iff `payment_method` is `Credit`.
    pub credit_terms: Option<CreditTerms>,
}

impl CreateSaleInput {
    /// Runs every check that needs no store access.
    ///
    /// The engine calls this before opening a transaction, so malformed
    /// input never costs a write.
    pub fn validate(&self) -> CoreResult<()> {
        validate_item_count(self.items.len())?;

        for line in &self.items {
            validate_product_code(&line.code)?;
            validate_quantity(line.quantity)?;
            validate_unit_price(line.unit_price_cents)?;
        }

        validate_discount(self.discount_cents)?;

        match (self.payment_method, &self.credit_terms) {
            (PaymentMethod::Credit, Some(terms)) => {
                validate_customer_id(&terms.customer_id)?;
            }
            (PaymentMethod::Credit, None) => {
                return Err(ValidationError::Required {
                    field: "credit_terms".to_string(),
                }
                .into());
            }
            (_, Some(_)) => {
                return Err(ValidationError::NotAllowed {
                    field: "credit_terms".to_string(),
                    allowed: vec!["credit".to_string()],
                }
                .into());
            }
            (_, None) => {}
        }

        Ok(())
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Computed sale totals, exact to currency precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

/// Prices a sale from its lines and sale-level discount.
///
/// ## Errors
/// `InvalidTotal` when the discount exceeds the subtotal. A total of
/// exactly zero (a 100% discount) is accepted.
pub fn price_sale(items: &[SaleLineInput], discount_cents: i64) -> CoreResult<SaleTotals> {
    let subtotal: Money = items.iter().map(SaleLineInput::subtotal).sum();
    let total = subtotal - Money::from_cents(discount_cents);

    if total.is_negative() {
        return Err(CoreError::InvalidTotal {
            total_cents: total.cents(),
        });
    }

    Ok(SaleTotals {
        subtotal_cents: subtotal.cents(),
        discount_cents,
        total_cents: total.cents(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(code: &str, quantity: i64, unit_price_cents: i64) -> SaleLineInput {
        SaleLineInput {
            code: code.to_string(),
            quantity,
            unit_price_cents,
        }
    }

    fn cash_input(items: Vec<SaleLineInput>, discount_cents: i64) -> CreateSaleInput {
        CreateSaleInput {
            items,
            payment_method: PaymentMethod::Cash,
            discount_cents,
            store_id: None,
            user_id: None,
            credit_terms: None,
        }
    }

    #[test]
    fn test_price_sale_totals() {
        let items = vec![line("A", 2, 1000), line("B", 3, 299)];
        let totals = price_sale(&items, 97).unwrap();

        assert_eq!(totals.subtotal_cents, 2897);
        assert_eq!(totals.discount_cents, 97);
        assert_eq!(totals.total_cents, 2800);
        // Invariant: total = sum(line subtotals) - discount, exactly.
        let line_sum: i64 = items.iter().map(|l| l.subtotal().cents()).sum();
        assert_eq!(totals.total_cents, line_sum - totals.discount_cents);
    }

    #[test]
    fn test_price_sale_full_discount_is_allowed() {
        let items = vec![line("A", 1, 500)];
        let totals = price_sale(&items, 500).unwrap();
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn test_price_sale_rejects_negative_total() {
        let items = vec![line("A", 1, 500)];
        let err = price_sale(&items, 501).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTotal { total_cents: -1 }));
    }

    #[test]
    fn test_validate_rejects_empty_items() {
        let input = cash_input(vec![], 0);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_lines() {
        let input = cash_input(vec![line("A", 0, 100)], 0);
        assert!(input.validate().is_err());

        let input = cash_input(vec![line("A", 1, 0)], 0);
        assert!(input.validate().is_err());

        let input = cash_input(vec![line("", 1, 100)], 0);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_validate_credit_requires_terms() {
        let mut input = cash_input(vec![line("A", 1, 100)], 0);
        input.payment_method = PaymentMethod::Credit;
        assert!(input.validate().is_err());

        input.credit_terms = Some(CreditTerms {
            customer_id: "cust-1".to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        });
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_terms_forbidden_without_credit_method() {
        let mut input = cash_input(vec![line("A", 1, 100)], 0);
        input.credit_terms = Some(CreditTerms {
            customer_id: "cust-1".to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        });
        assert!(input.validate().is_err());
    }
}
