//! # Sale Repository
//!
//! The sale transaction engine.
//!
//! ## Sale Lifecycle
//!
//!   create_sale()
//!     one transaction: sale row + item rows (price snapshot)
//!     + conditional stock debit + optional linked credit
//!        |
//!        v
//!   Created --(cancel_sale)--> Voided   (terminal)
//!
//! There are no other transitions. A voided sale stays queryable
//! forever; sales are never physically deleted.
//!
//! ## Atomicity
//!
//! Every mutating operation runs inside a single sqlx transaction. Any
//! failure at any step - unknown product, short stock, constraint
//! violation - rolls back the sale, its items, the stock debit and the
//! credit row together. No intermediate state is ever visible to a
//! concurrent reader.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::credit::{CreatedCredit, CreditRepository};
use crate::repository::product::{ProductRepository, StockMovement};
use crate::repository::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use arca_core::checkout::price_sale;
use arca_core::{CoreError, CreateSaleInput, PaymentMethod, Sale, SaleItem, ValidationError};

// =============================================================================
// Outputs
// =============================================================================

/// What `create_sale` hands back to the request layer.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedSale {
    pub sale_id: String,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    /// Present iff the sale was paid with store credit.
    pub credit: Option<CreatedCredit>,
}

/// A sale with its line items (pure read).
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// List Filter
// =============================================================================

/// Typed filter for `list_sales`.
///
/// Compiles to parameterized WHERE clauses - filter values only ever
/// travel as binds, never as SQL text.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub store_id: Option<String>,
    pub user_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub voided: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SaleFilter {
    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE))
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.offset.unwrap_or(0))
    }
}

// =============================================================================
// Repository
// =============================================================================

const SALE_COLUMNS: &str = "id, store_id, user_id, payment_method, \
     subtotal_cents, discount_cents, total_cents, voided, created_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, code_snapshot, name_snapshot, \
     quantity, unit_price_cents, subtotal_cents, created_at";

/// Repository for the sale transaction engine.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Creates a sale: validates, resolves, prices, then persists the
    /// sale, its items, the stock debit and the optional credit in one
    /// atomic transaction.
    ///
    /// ## Errors
    /// - `Validation` - empty items, non-positive quantity/price,
    ///   negative discount, missing/forbidden credit terms
    /// - `ProductNotFound` - unknown product code
    /// - `InvalidTotal` - discount exceeds subtotal
    /// - `InsufficientStock` - conditional debit found fewer units
    pub async fn create_sale(&self, input: &CreateSaleInput) -> DbResult<CreatedSale> {
        // Everything that can fail without touching the store fails here.
        input.validate()?;
        let totals = price_sale(&input.items, input.discount_cents)?;

        // A receivable of zero has nothing to repay.
        if input.credit_terms.is_some() && totals.total_cents == 0 {
            return Err(CoreError::Validation(ValidationError::MustBePositive {
                field: "total".to_string(),
            })
            .into());
        }

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // Resolve every code before the first write.
        let mut resolved = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let product = ProductRepository::resolve_by_code(&mut tx, &line.code).await?;
            resolved.push(product);
        }
        let movements: Vec<StockMovement> = resolved
            .iter()
            .zip(&input.items)
            .map(|(product, line)| StockMovement {
                product_id: product.id.clone(),
                code: product.code.clone(),
                quantity: line.quantity,
            })
            .collect();

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, store_id, user_id, payment_method,
                subtotal_cents, discount_cents, total_cents,
                voided, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale_id)
        .bind(input.store_id.as_deref())
        .bind(input.user_id.as_deref())
        .bind(input.payment_method)
        .bind(totals.subtotal_cents)
        .bind(totals.discount_cents)
        .bind(totals.total_cents)
        .bind(false)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Item rows freeze the quoted unit price and the product
        // identity as they were at sale time.
        for (line, product) in input.items.iter().zip(&resolved) {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, code_snapshot, name_snapshot,
                    quantity, unit_price_cents, subtotal_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale_id)
            .bind(&product.id)
            .bind(&product.code)
            .bind(&product.name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.subtotal().cents())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        ProductRepository::reserve_and_debit(&mut tx, &movements).await?;

        let credit = match &input.credit_terms {
            Some(terms) => Some(
                CreditRepository::create_for_sale(
                    &mut tx,
                    &sale_id,
                    &terms.customer_id,
                    totals.total_cents,
                    terms.due_date,
                )
                .await?,
            ),
            None => None,
        };

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            total_cents = %totals.total_cents,
            items = input.items.len(),
            method = input.payment_method.as_str(),
            "Sale created"
        );

        Ok(CreatedSale {
            sale_id,
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            total_cents: totals.total_cents,
            credit,
        })
    }

    /// Cancels (voids) a sale, restoring the stock of every recorded
    /// item exactly once.
    ///
    /// ## Errors
    /// - `SaleNotFound` - unknown sale
    /// - `AlreadyVoided` - void is terminal; the second caller observes
    ///   failure, not a silent no-op
    /// - `Conflict` - the linked credit already has recorded payments;
    ///   settle it out of band before cancelling
    ///
    /// A linked credit with no payments is closed (balance to zero) in
    /// the same transaction, so the aging report never carries
    /// receivables for returned stock.
    pub async fn cancel_sale(&self, sale_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = Self::fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::Domain(CoreError::SaleNotFound(sale_id.to_string())))?;

        if sale.voided {
            return Err(CoreError::AlreadyVoided(sale_id.to_string()).into());
        }

        let credit = CreditRepository::find_by_sale(&mut tx, sale_id).await?;
        if let Some(credit) = &credit {
            let payments = CreditRepository::count_payments(&mut tx, &credit.id).await?;
            if payments > 0 {
                return Err(CoreError::Conflict(format!(
                    "credit {} has recorded payments; settle it before cancelling sale {}",
                    credit.id, sale_id
                ))
                .into());
            }
        }

        // The guarded update is the race gate: of two concurrent
        // cancellations exactly one flips the flag, the other sees zero
        // rows and fails.
        let result = sqlx::query("UPDATE sales SET voided = 1 WHERE id = ?1 AND voided = 0")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::AlreadyVoided(sale_id.to_string()).into());
        }

        let items = Self::fetch_items(&mut tx, sale_id).await?;
        let movements: Vec<StockMovement> = items
            .iter()
            .map(|item| StockMovement {
                product_id: item.product_id.clone(),
                code: item.code_snapshot.clone(),
                quantity: item.quantity,
            })
            .collect();

        ProductRepository::restore(&mut tx, &movements).await?;

        if let Some(credit) = &credit {
            CreditRepository::close_for_cancelled_sale(&mut tx, &credit.id).await?;
        }

        tx.commit().await?;

        info!(sale_id = %sale_id, items = items.len(), "Sale cancelled");
        Ok(())
    }

    /// Gets a sale with its items. Pure read.
    pub async fn get_sale(&self, sale_id: &str) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;

        let sale = Self::fetch_sale(&mut conn, sale_id)
            .await?
            .ok_or_else(|| DbError::Domain(CoreError::SaleNotFound(sale_id.to_string())))?;

        let items = Self::fetch_items(&mut conn, sale_id).await?;

        Ok(SaleDetail { sale, items })
    }

    /// Lists sales newest-first, honoring every filter field. Pure read.
    pub async fn list_sales(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        debug!(?filter, "Listing sales");

        let mut sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE 1=1");
        if filter.created_from.is_some() {
            sql.push_str(" AND created_at >= ?");
        }
        if filter.created_to.is_some() {
            sql.push_str(" AND created_at <= ?");
        }
        if filter.store_id.is_some() {
            sql.push_str(" AND store_id = ?");
        }
        if filter.user_id.is_some() {
            sql.push_str(" AND user_id = ?");
        }
        if filter.payment_method.is_some() {
            sql.push_str(" AND payment_method = ?");
        }
        if filter.voided.is_some() {
            sql.push_str(" AND voided = ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, Sale>(&sql);
        if let Some(from) = filter.created_from {
            query = query.bind(from);
        }
        if let Some(to) = filter.created_to {
            query = query.bind(to);
        }
        if let Some(store_id) = &filter.store_id {
            query = query.bind(store_id);
        }
        if let Some(user_id) = &filter.user_id {
            query = query.bind(user_id);
        }
        if let Some(method) = filter.payment_method {
            query = query.bind(method);
        }
        if let Some(voided) = filter.voided {
            query = query.bind(voided);
        }
        let query = query.bind(filter.limit()).bind(filter.offset());

        let sales = query.fetch_all(&self.pool).await?;
        Ok(sales)
    }

    // =========================================================================
    // Shared fetch helpers
    // =========================================================================

    async fn fetch_sale(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(conn)
        .await?;

        Ok(sale)
    }

    async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
        ))
        .bind(sale_id)
        .fetch_all(conn)
        .await?;

        Ok(items)
    }
}
