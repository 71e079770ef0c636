//! # Repository Module
//!
//! Repository implementations for the three ledgers.
//!
//! ## Pattern
//!
//! Each repository wraps the connection pool and exposes:
//! - pool-level methods for reads and standalone writes
//! - transaction-scoped associated functions taking a
//!   `&mut SqliteConnection`, for the operations that only make sense
//!   inside somebody else's atomic unit (stock debit/restore, credit
//!   creation at sale time)
//!
//! The sale repository owns the cross-ledger transactions: a sale, its
//! items, the stock debit and the optional credit row appear atomically
//! or not at all.

pub mod credit;
pub mod product;
pub mod sale;

/// Default page size for list queries.
pub(crate) const DEFAULT_PAGE_SIZE: u32 = 50;

/// Hard ceiling on page size for list queries.
pub(crate) const MAX_PAGE_SIZE: u32 = 200;
