//! # arca-core: Pure Business Logic for Arca POS
//!
//! This crate is the heart of the Arca POS transactional core. It
//! contains all business rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//!
//! Request layer (auth, routing, rendering - out of scope)
//!        |
//!        v
//! arca-db (storage layer: pool, migrations, repositories,
//!          every transaction boundary)
//!        |
//!        v
//! arca-core (THIS CRATE)
//!        - types      Product, Sale, SaleItem, Credit, CreditPayment
//!        - money      integer-cents Money (no floating point!)
//!        - checkout   sale input + pricing
//!        - credit     payment state machine, effective status, aging
//!        - validation field-level rules
//!        - error      typed taxonomy with stable kinds
//!
//!   NO I/O - NO DATABASE - NO NETWORK - PURE FUNCTIONS
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic - same input, same output
//! 2. **No I/O**: database, network and file access are FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64); floats
//!    would accumulate drift across totals, discounts and installments
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use arca_core::checkout::{price_sale, SaleLineInput};
//!
//! let items = vec![SaleLineInput {
//!     code: "COFFEE-250".to_string(),
//!     quantity: 2,
//!     unit_price_cents: 1099,
//! }];
//!
//! let totals = price_sale(&items, 198).unwrap();
//! assert_eq!(totals.subtotal_cents, 2198);
//! assert_eq!(totals.total_cents, 2000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod credit;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use arca_core::Money` instead of
// `use arca_core::money::Money`.

pub use checkout::{CreateSaleInput, CreditTerms, SaleLineInput, SaleTotals};
pub use credit::{AddPaymentInput, AgingReport, PaymentOutcome};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway requests and keeps transaction sizes reasonable.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
