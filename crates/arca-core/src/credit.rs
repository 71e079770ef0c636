//! # Credit Module
//!
//! Pure receivable logic: the payment state machine, the read-time status
//! view, and the aging partition.
//!
//! ## Status State Machine
//!
//! Transitions occur only on payment application:
//!
//!   open --(partial payment)--> partial --(final payment)--> closed
//!
//! with `overdue` replacing `partial` when the due date has already
//! passed at payment time. `closed` is terminal.
//!
//! The stored status is therefore a payment-time snapshot. Read paths use
//! [`effective_status`] so a receivable whose due date passed without a
//! new payment is still reported overdue.
//!
//! ## Typed Input
//!
//! [`AddPaymentInput`] is the validated boundary structure for payment
//! application, mirroring [`crate::checkout::CreateSaleInput`] on the
//! sale side.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Credit, CreditStatus, PaymentMethod};
use crate::validation::validate_payment_amount;

// =============================================================================
// Payment Application
// =============================================================================

/// Validated input for applying a payment to a credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPaymentInput {
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

impl AddPaymentInput {
    /// Field-level checks that need no store access.
    pub fn validate(&self) -> CoreResult<()> {
        validate_payment_amount(self.amount_cents)?;

        // Repaying store credit with more store credit is not a thing.
        if self.method == PaymentMethod::Credit {
            return Err(ValidationError::NotAllowed {
                field: "method".to_string(),
                allowed: vec![
                    "cash".to_string(),
                    "card".to_string(),
                    "transfer".to_string(),
                ],
            }
            .into());
        }

        Ok(())
    }
}

/// Result of applying a payment: the balance and status the store must
/// persist atomically with the payment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub new_balance_cents: i64,
    pub new_status: CreditStatus,
}

/// Applies a payment against a credit, enforcing the ledger rules.
///
/// ## Errors
/// - `AlreadySettled` when the balance is already zero
/// - `Validation` when the amount is not positive
/// - `Overpayment` when the amount exceeds the remaining balance
///
/// ## Status
/// `closed` when the new balance reaches zero, else `overdue` when the
/// due date has passed, else `partial`.
pub fn apply_payment(credit: &Credit, amount_cents: i64, today: NaiveDate) -> CoreResult<PaymentOutcome> {
    if credit.balance_cents <= 0 {
        return Err(CoreError::AlreadySettled(credit.id.clone()));
    }

    validate_payment_amount(amount_cents)?;

    if amount_cents > credit.balance_cents {
        return Err(CoreError::Overpayment {
            requested_cents: amount_cents,
            balance_cents: credit.balance_cents,
        });
    }

    let new_balance = Money::from_cents(credit.balance_cents) - Money::from_cents(amount_cents);
    let new_status = if new_balance.is_zero() {
        CreditStatus::Closed
    } else if credit.due_date < today {
        CreditStatus::Overdue
    } else {
        CreditStatus::Partial
    };

    Ok(PaymentOutcome {
        new_balance_cents: new_balance.cents(),
        new_status,
    })
}

// =============================================================================
// Read-Time Status
// =============================================================================

/// Status as of `as_of`, derived from `(balance, due_date)`.
///
/// The stored column only moves at payment time; this view is what
/// reports and statements show, so a credit past its due date is never
/// presented as `open`/`partial` merely because nobody paid since.
pub fn effective_status(credit: &Credit, as_of: NaiveDate) -> CreditStatus {
    if credit.balance_cents <= 0 {
        CreditStatus::Closed
    } else if credit.due_date < as_of {
        CreditStatus::Overdue
    } else {
        credit.status
    }
}

// =============================================================================
// Aging Partition
// =============================================================================

/// Outstanding balances partitioned by days past due.
///
/// Buckets: current (not yet due), 1-30, 31-60, 61-90, 90+ days past
/// due. Only credits with `balance > 0` contribute, and every such
/// balance lands in exactly one bucket, so the five buckets always sum
/// to the total outstanding balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingReport {
    pub current_cents: i64,
    pub days_0_30_cents: i64,
    pub days_31_60_cents: i64,
    pub days_61_90_cents: i64,
    pub days_90_plus_cents: i64,
}

impl AgingReport {
    /// Folds one receivable into the partition. Settled credits are
    /// skipped.
    pub fn accumulate(&mut self, balance_cents: i64, due_date: NaiveDate, as_of: NaiveDate) {
        if balance_cents <= 0 {
            return;
        }

        let days_past_due = (as_of - due_date).num_days();
        let bucket = if days_past_due <= 0 {
            &mut self.current_cents
        } else if days_past_due <= 30 {
            &mut self.days_0_30_cents
        } else if days_past_due <= 60 {
            &mut self.days_31_60_cents
        } else if days_past_due <= 90 {
            &mut self.days_61_90_cents
        } else {
            &mut self.days_90_plus_cents
        };
        *bucket += balance_cents;
    }

    /// Sum of all five buckets: total outstanding balance.
    pub fn outstanding_cents(&self) -> i64 {
        self.current_cents
            + self.days_0_30_cents
            + self.days_31_60_cents
            + self.days_61_90_cents
            + self.days_90_plus_cents
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
