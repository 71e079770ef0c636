//! # arca-db: Database Layer for Arca POS
//!
//! This crate provides storage and the transactional engine for the
//! Arca POS core. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//!
//! Request layer (out of scope: auth, routing, rendering)
//!      |
//!      v
//! arca-db (THIS CRATE)
//!      - pool.rs        connection pool, WAL, busy timeout
//!      - migrations.rs  embedded schema migrations
//!      - repository/    ProductRepository (inventory ledger)
//!                       SaleRepository    (sale engine)
//!                       CreditRepository  (credit ledger)
//!      |
//!      v
//! SQLite database file (or :memory: in tests)
//!
//! ## Transaction Discipline
//!
//! Every mutating operation is one atomic transaction. Cross-ledger
//! writes (sale + items + stock debit + credit) happen on a single
//! transaction connection that the sale repository owns and the other
//! repositories borrow. Races are settled by conditional UPDATEs, never
//! by read-then-write.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arca_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/arca.db")).await?;
//!
//! let outcome = db.sales().create_sale(&input).await?;
//! let receipt = db.credits().add_payment(&credit_id, &payment).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::credit::{
    CreatedCredit, CreditDetail, CreditFilter, CreditRepository, CustomerStatement,
    PaymentReceipt, StatementLine,
};
pub use repository::product::{ProductRepository, StockMovement};
pub use repository::sale::{CreatedSale, SaleDetail, SaleFilter, SaleRepository};
