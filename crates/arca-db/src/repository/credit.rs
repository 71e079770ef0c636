//! # Credit Repository
//!
//! The credit ledger: receivables created alongside credit-method sales
//! and repaid through payments.
//!
//! ## Serialization of Payments
//!
//! `add_payment` reads the balance and writes the new one inside a
//! single transaction, and the write is guarded on the balance it read:
//!
//!   UPDATE credits SET balance_cents = ?, status = ?
//!   WHERE id = ? AND balance_cents = ?observed
//!
//! Two simultaneous payments against the same credit cannot both succeed
//! past the true remaining amount - the loser affects zero rows, gets a
//! `Conflict`, and its payment row rolls back with it.
//!
//! ## Creation
//!
//! `create_for_sale` only takes a transaction connection: a credit can
//! only come into being inside a sale's atomic unit, never with an
//! arbitrary total disconnected from a sale.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use arca_core::credit::{apply_payment, effective_status};
use arca_core::{AddPaymentInput, AgingReport, CoreError, Credit, CreditPayment, CreditStatus};

// =============================================================================
// Outputs
// =============================================================================

/// What credit creation reports back (nested in `CreatedSale`).
#[derive(Debug, Clone, Serialize)]
pub struct CreatedCredit {
    pub credit_id: String,
    pub balance_cents: i64,
    pub status: CreditStatus,
}

/// What `add_payment` hands back to the request layer.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub new_balance_cents: i64,
    pub new_status: CreditStatus,
}

/// A credit with its ordered payment history (pure read).
#[derive(Debug, Clone, Serialize)]
pub struct CreditDetail {
    pub credit: Credit,
    /// Derived from (balance, due_date, today); never stale.
    pub effective_status: CreditStatus,
    pub payments: Vec<CreditPayment>,
}

/// One credit line of a customer statement.
#[derive(Debug, Clone, Serialize)]
pub struct StatementLine {
    pub credit: Credit,
    pub effective_status: CreditStatus,
    pub payments_count: usize,
    pub paid_cents: i64,
    pub payments: Vec<CreditPayment>,
}

/// All credits and payments for one customer, consumed by the
/// out-of-scope export layer.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerStatement {
    pub customer_id: String,
    pub credits: Vec<StatementLine>,
}

// =============================================================================
// List Filter
// =============================================================================

/// Typed filter for `list_credits`. Values only travel as binds.
#[derive(Debug, Clone, Default)]
pub struct CreditFilter {
    pub customer_id: Option<String>,
    /// Filters on the stored (payment-time) status column.
    pub status: Option<CreditStatus>,
    /// Only credits with outstanding balance past their due date.
    pub overdue_only: bool,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl CreditFilter {
    fn limit(&self) -> i64 {
        i64::from(self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE))
    }

    fn offset(&self) -> i64 {
        i64::from(self.offset.unwrap_or(0))
    }
}

// =============================================================================
// Repository
// =============================================================================

const CREDIT_COLUMNS: &str =
    "id, sale_id, customer_id, total_cents, balance_cents, due_date, status, created_at";

const PAYMENT_COLUMNS: &str = "id, credit_id, amount_cents, method, notes, paid_at";

/// Repository for the credit ledger.
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    /// Creates a new CreditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CreditRepository { pool }
    }

    // =========================================================================
    // Ledger operations (transaction-scoped)
    // =========================================================================

    /// Creates the receivable for a credit-method sale, inside the
    /// sale's transaction. Balance starts at the sale total, status at
    /// `open`.
    pub async fn create_for_sale(
        conn: &mut SqliteConnection,
        sale_id: &str,
        customer_id: &str,
        total_cents: i64,
        due_date: NaiveDate,
    ) -> DbResult<CreatedCredit> {
        let credit_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO credits (
                id, sale_id, customer_id, total_cents, balance_cents,
                due_date, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&credit_id)
        .bind(sale_id)
        .bind(customer_id)
        .bind(total_cents)
        .bind(total_cents)
        .bind(due_date)
        .bind(CreditStatus::Open)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        debug!(credit_id = %credit_id, sale_id = %sale_id, total_cents, "Credit created");

        Ok(CreatedCredit {
            credit_id,
            balance_cents: total_cents,
            status: CreditStatus::Open,
        })
    }

    /// Finds the credit linked to a sale, if any.
    pub async fn find_by_sale(
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Option<Credit>> {
        let credit = sqlx::query_as::<_, Credit>(&format!(
            "SELECT {CREDIT_COLUMNS} FROM credits WHERE sale_id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(conn)
        .await?;

        Ok(credit)
    }

    /// Counts recorded payments against a credit.
    pub async fn count_payments(conn: &mut SqliteConnection, credit_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM credit_payments WHERE credit_id = ?1")
                .bind(credit_id)
                .fetch_one(conn)
                .await?;

        Ok(count)
    }

    /// Zeroes and closes a payment-free credit whose sale is being
    /// cancelled, inside the cancellation transaction.
    pub async fn close_for_cancelled_sale(
        conn: &mut SqliteConnection,
        credit_id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE credits SET balance_cents = 0, status = ?2 WHERE id = ?1")
            .bind(credit_id)
            .bind(CreditStatus::Closed)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CreditNotFound(credit_id.to_string()).into());
        }

        debug!(credit_id = %credit_id, "Credit closed with cancelled sale");
        Ok(())
    }

    // =========================================================================
    // Payment application
    // =========================================================================

    /// Applies a payment: inserts the payment row and moves
    /// balance+status in one transaction.
    ///
    /// ## Errors
    /// - `CreditNotFound` - unknown credit
    /// - `AlreadySettled` - balance is already zero
    /// - `Validation` - non-positive amount, credit-method repayment
    /// - `Overpayment` - amount exceeds the remaining balance
    /// - `Conflict` - a concurrent payment moved the balance first
    pub async fn add_payment(
        &self,
        credit_id: &str,
        input: &AddPaymentInput,
    ) -> DbResult<PaymentReceipt> {
        input.validate()?;

        let today = Utc::now().date_naive();
        let mut tx = self.pool.begin().await?;

        let credit = Self::fetch_credit(&mut tx, credit_id)
            .await?
            .ok_or_else(|| DbError::Domain(CoreError::CreditNotFound(credit_id.to_string())))?;

        let outcome = apply_payment(&credit, input.amount_cents, today)?;

        let payment_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO credit_payments (
                id, credit_id, amount_cents, method, notes, paid_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&payment_id)
        .bind(credit_id)
        .bind(input.amount_cents)
        .bind(input.method)
        .bind(input.notes.as_deref())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Guarded on the balance we read: a concurrent payment that
        // committed in between makes this affect zero rows, and the
        // whole attempt (payment row included) rolls back.
        let result = sqlx::query(
            r#"
            UPDATE credits
            SET balance_cents = ?2, status = ?3
            WHERE id = ?1 AND balance_cents = ?4
            "#,
        )
        .bind(credit_id)
        .bind(outcome.new_balance_cents)
        .bind(outcome.new_status)
        .bind(credit.balance_cents)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict(format!(
                "balance of credit {credit_id} changed concurrently"
            ))
            .into());
        }

        tx.commit().await?;

        info!(
            credit_id = %credit_id,
            payment_id = %payment_id,
            amount_cents = input.amount_cents,
            new_balance_cents = outcome.new_balance_cents,
            new_status = outcome.new_status.as_str(),
            "Payment applied"
        );

        Ok(PaymentReceipt {
            payment_id,
            new_balance_cents: outcome.new_balance_cents,
            new_status: outcome.new_status,
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a credit with its ordered payment history. Pure read.
    pub async fn get_credit(&self, credit_id: &str) -> DbResult<CreditDetail> {
        let mut conn = self.pool.acquire().await?;

        let credit = Self::fetch_credit(&mut conn, credit_id)
            .await?
            .ok_or_else(|| DbError::Domain(CoreError::CreditNotFound(credit_id.to_string())))?;

        let payments = Self::fetch_payments(&mut conn, credit_id).await?;
        let as_of = Utc::now().date_naive();

        Ok(CreditDetail {
            effective_status: effective_status(&credit, as_of),
            credit,
            payments,
        })
    }

    /// Lists credits newest-first, honoring every filter field. Pure read.
    pub async fn list_credits(&self, filter: &CreditFilter) -> DbResult<Vec<Credit>> {
        debug!(?filter, "Listing credits");

        let mut sql = format!("SELECT {CREDIT_COLUMNS} FROM credits WHERE 1=1");
        if filter.customer_id.is_some() {
            sql.push_str(" AND customer_id = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.overdue_only {
            sql.push_str(" AND balance_cents > 0 AND due_date < ?");
        }
        if filter.created_from.is_some() {
            sql.push_str(" AND created_at >= ?");
        }
        if filter.created_to.is_some() {
            sql.push_str(" AND created_at <= ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, Credit>(&sql);
        if let Some(customer_id) = &filter.customer_id {
            query = query.bind(customer_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if filter.overdue_only {
            query = query.bind(Utc::now().date_naive());
        }
        if let Some(from) = filter.created_from {
            query = query.bind(from);
        }
        if let Some(to) = filter.created_to {
            query = query.bind(to);
        }
        let query = query.bind(filter.limit()).bind(filter.offset());

        let credits = query.fetch_all(&self.pool).await?;
        Ok(credits)
    }

    /// Partitions every outstanding balance by days past due, computed
    /// at read time. The five buckets sum to the total outstanding
    /// balance exactly.
    pub async fn aging_report(&self, as_of: NaiveDate) -> DbResult<AgingReport> {
        let rows: Vec<(i64, NaiveDate)> =
            sqlx::query_as("SELECT balance_cents, due_date FROM credits WHERE balance_cents > 0")
                .fetch_all(&self.pool)
                .await?;

        let mut report = AgingReport::default();
        for (balance_cents, due_date) in rows {
            report.accumulate(balance_cents, due_date, as_of);
        }

        Ok(report)
    }

    /// All credits with nested payments for one customer. Pure read.
    ///
    /// ## Errors
    /// `CustomerNotFound` when the customer has no credit history at
    /// all - the only observable difference between an unknown customer
    /// and one who never bought on credit.
    pub async fn customer_statement(&self, customer_id: &str) -> DbResult<CustomerStatement> {
        let credits = sqlx::query_as::<_, Credit>(&format!(
            "SELECT {CREDIT_COLUMNS} FROM credits WHERE customer_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        if credits.is_empty() {
            return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
        }

        let as_of = Utc::now().date_naive();
        let mut conn = self.pool.acquire().await?;

        let mut lines = Vec::with_capacity(credits.len());
        for credit in credits {
            let payments = Self::fetch_payments(&mut conn, &credit.id).await?;
            lines.push(StatementLine {
                effective_status: effective_status(&credit, as_of),
                payments_count: payments.len(),
                paid_cents: payments.iter().map(|p| p.amount_cents).sum(),
                credit,
                payments,
            });
        }

        Ok(CustomerStatement {
            customer_id: customer_id.to_string(),
            credits: lines,
        })
    }

    // =========================================================================
    // Shared fetch helpers
    // =========================================================================

    async fn fetch_credit(
        conn: &mut SqliteConnection,
        credit_id: &str,
    ) -> DbResult<Option<Credit>> {
        let credit = sqlx::query_as::<_, Credit>(&format!(
            "SELECT {CREDIT_COLUMNS} FROM credits WHERE id = ?1"
        ))
        .bind(credit_id)
        .fetch_optional(conn)
        .await?;

        Ok(credit)
    }

    async fn fetch_payments(
        conn: &mut SqliteConnection,
        credit_id: &str,
    ) -> DbResult<Vec<CreditPayment>> {
        let payments = sqlx::query_as::<_, CreditPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM credit_payments WHERE credit_id = ?1 ORDER BY paid_at, id"
        ))
        .bind(credit_id)
        .fetch_all(conn)
        .await?;

        Ok(payments)
    }
}
