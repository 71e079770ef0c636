//! # Product Repository
//!
//! The inventory ledger plus the minimal catalog surface.
//!
//! ## Stock Discipline
//!
//! The debit is a conditional update, not a read-then-write:
//!
//!   UPDATE products SET stock = stock - ?qty
//!   WHERE id = ? AND stock >= ?qty
//!
//! Zero rows affected means another writer took the stock first (or it
//! was never there); the caller's transaction rolls back and the request
//! observes `InsufficientStock`. Two concurrent sales can never both
//! pass the availability check against the same unit of stock.
//!
//! The ledger operations (`reserve_and_debit`, `restore`) take the
//! caller's transaction connection: the inventory ledger has no
//! transaction boundary of its own.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use arca_core::{CoreError, Product};

/// One stock movement inside a sale creation or cancellation.
#[derive(Debug, Clone)]
pub struct StockMovement {
    pub product_id: String,
    /// Business code, carried for error context.
    pub code: String,
    pub quantity: i64,
}

/// Repository for the inventory ledger and the catalog rows behind it.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Catalog operations (pool-level)
    // =========================================================================

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, price_cents, cost_cents, stock,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, price_cents, cost_cents, stock,
                   created_at, updated_at
            FROM products
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, price_cents, cost_cents, stock,
                   created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Adjusts stock by a delta (external catalog adjustment: restock,
    /// shrinkage correction).
    ///
    /// The same conditional guard as the sale debit: an adjustment that
    /// would take stock negative affects zero rows and is rejected.
    pub async fn adjust_stock(&self, code: &str, delta: i64) -> DbResult<()> {
        debug!(code = %code, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE code = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(code)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let existing = self.get_by_code(code).await?;
            return match existing {
                None => Err(CoreError::ProductNotFound(code.to_string()).into()),
                Some(p) => Err(CoreError::InsufficientStock {
                    code: code.to_string(),
                    available: p.stock,
                    requested: -delta,
                }
                .into()),
            };
        }

        Ok(())
    }

    /// Counts products (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Ledger operations (transaction-scoped)
    // =========================================================================

    /// Resolves a product by code inside the caller's transaction.
    ///
    /// ## Errors
    /// `ProductNotFound` when the code is unknown.
    pub async fn resolve_by_code(
        conn: &mut SqliteConnection,
        code: &str,
    ) -> DbResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, price_cents, cost_cents, stock,
                   created_at, updated_at
            FROM products
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;

        product.ok_or_else(|| DbError::Domain(CoreError::ProductNotFound(code.to_string())))
    }

    /// Atomically verifies and debits stock for every movement.
    ///
    /// Any single line failing aborts the whole batch: the error
    /// propagates, the caller's transaction rolls back, and no partial
    /// debit survives.
    pub async fn reserve_and_debit(
        conn: &mut SqliteConnection,
        movements: &[StockMovement],
    ) -> DbResult<()> {
        let now = Utc::now();

        for movement in movements {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(&movement.product_id)
            .bind(movement.quantity)
            .bind(now)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                // Zero rows: either the product vanished or the stock is
                // short. Re-read for the error message; the transaction
                // is rolling back either way.
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                        .bind(&movement.product_id)
                        .fetch_optional(&mut *conn)
                        .await?;

                return match available {
                    None => Err(CoreError::ProductNotFound(movement.code.clone()).into()),
                    Some(stock) => Err(CoreError::InsufficientStock {
                        code: movement.code.clone(),
                        available: stock,
                        requested: movement.quantity,
                    }
                    .into()),
                };
            }

            debug!(
                product_id = %movement.product_id,
                quantity = %movement.quantity,
                "Stock debited"
            );
        }

        Ok(())
    }

    /// Restores stock for every movement. Used only by cancellation.
    ///
    /// Never fails under normal conditions; a missing product is a
    /// defensive `ProductNotFound`.
    pub async fn restore(
        conn: &mut SqliteConnection,
        movements: &[StockMovement],
    ) -> DbResult<()> {
        let now = Utc::now();

        for movement in movements {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock + ?2, updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(&movement.product_id)
            .bind(movement.quantity)
            .bind(now)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                return Err(CoreError::ProductNotFound(movement.code.clone()).into());
            }

            debug!(
                product_id = %movement.product_id,
                quantity = %movement.quantity,
                "Stock restored"
            );
        }

        Ok(())
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
