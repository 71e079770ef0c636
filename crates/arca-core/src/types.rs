//! # Domain Types
//!
//! Core domain types for the three ledgers.
//!
//! ## Type Hierarchy
//!
//! - `Product` - stock-tracked catalog entry (inventory ledger)
//! - `Sale` / `SaleItem` - sale record with frozen line items
//! - `Credit` / `CreditPayment` - receivable repaid over time
//! - `PaymentMethod` / `CreditStatus` - closed enums persisted as text
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - a business key where one exists (product `code`)
//!
//! ## Snapshot Pattern
//! `SaleItem` copies the product code, name and the quoted unit price at
//! sale time. A later catalog edit never rewrites sale history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A stock-tracked product.
///
/// Stock is mutated only by sale creation (debit), sale cancellation
/// (restore) and external catalog adjustment. It is never negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business identifier, unique across the catalog (e.g. "COFFEE-250").
    pub code: String,

    /// Display name.
    pub name: String,

    /// Catalog unit price in cents.
    pub price_cents: i64,

    /// Unit cost in cents (for margin reporting, out of core scope).
    pub cost_cents: Option<i64>,

    /// Current stock level. Invariant: never negative.
    pub stock: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the catalog price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale (or a credit installment) was paid.
///
/// A closed set - free-form method strings never reach the core.
/// `Credit` on a sale is what creates a linked receivable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank transfer.
    Transfer,
    /// Store credit: the sale creates a receivable repaid over time.
    Credit,
}

impl PaymentMethod {
    /// Name as persisted and as exposed on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Credit => "credit",
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A persisted sale.
///
/// ## Lifecycle
/// Created together with its items, never deleted. The only transition is
/// `voided: false -> true`, and it is terminal: a second void attempt is
/// rejected, never silently accepted.
///
/// ## Invariant
/// `total_cents = subtotal_cents - discount_cents` and `total_cents >= 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub store_id: Option<String>,
    pub user_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub voided: bool,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at sale time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product code at time of sale (frozen).
    pub code_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold. Always positive.
    pub quantity: i64,
    /// Quoted unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// quantity x unit price.
    pub subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Credit Status
// =============================================================================

/// Stored status of a receivable.
///
/// Transitions happen only on payment application:
/// `open -> partial -> closed` (terminal), with `overdue` replacing
/// `partial` when the due date has passed at payment time. The stored
/// value is a payment-time snapshot; read paths report
/// [`effective_status`](crate::credit::effective_status) so a credit is
/// never treated as current after its due date merely because no payment
/// arrived to refresh the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    /// No payment applied yet.
    Open,
    /// Partially repaid, not past due at last payment.
    Partial,
    /// Balance reached zero. Terminal: accepts no further payments.
    Closed,
    /// Past due with remaining balance at last payment.
    Overdue,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Open => "open",
            CreditStatus::Partial => "partial",
            CreditStatus::Closed => "closed",
            CreditStatus::Overdue => "overdue",
        }
    }
}

// =============================================================================
// Credit
// =============================================================================

/// A store-issued receivable, linked 1:1 to the sale that produced it.
///
/// ## Invariant
/// `balance_cents == total_cents - sum(payments.amount_cents)` at all
/// times, and a credit whose balance reached zero is closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Credit {
    pub id: String,
    /// The sale this receivable was created with. Unique: 1:1.
    pub sale_id: String,
    pub customer_id: String,
    /// Copied from the sale total at creation.
    pub total_cents: i64,
    /// Remaining balance. Starts at `total_cents`, only payments move it.
    pub balance_cents: i64,
    pub due_date: NaiveDate,
    pub status: CreditStatus,
    pub created_at: DateTime<Utc>,
}

impl Credit {
    /// Returns the remaining balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }

    /// Whether the receivable still has an outstanding balance.
    #[inline]
    pub fn is_outstanding(&self) -> bool {
        self.balance_cents > 0
    }
}

// =============================================================================
// Credit Payment
// =============================================================================

/// A payment applied against a credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditPayment {
    pub id: String,
    pub credit_id: String,
    /// Amount in cents. Positive and never above the balance it was
    /// applied to.
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub paid_at: DateTime<Utc>,
}

impl CreditPayment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_as_str() {
        assert_eq!(PaymentMethod::Cash.as_str(), "cash");
        assert_eq!(PaymentMethod::Credit.as_str(), "credit");
    }

    #[test]
    fn test_credit_status_as_str() {
        assert_eq!(CreditStatus::Open.as_str(), "open");
        assert_eq!(CreditStatus::Overdue.as_str(), "overdue");
    }

    #[test]
    fn test_sale_item_money_views() {
        let item = SaleItem {
            id: "i1".to_string(),
            sale_id: "s1".to_string(),
            product_id: "p1".to_string(),
            code_snapshot: "COFFEE-250".to_string(),
            name_snapshot: "Coffee 250g".to_string(),
            quantity: 3,
            unit_price_cents: 299,
            subtotal_cents: 897,
            created_at: Utc::now(),
        };
        assert_eq!(item.unit_price().cents(), 299);
        assert_eq!(item.subtotal(), item.unit_price().multiply_quantity(3));
    }
}
