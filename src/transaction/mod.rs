//! The combined feed of a user's expenses and incomes.
//!
//! Transactions are never stored. Each request merges the expense and income tables, applies the
//! requested filters and returns one page of the result.

mod endpoint;
mod query;
mod view;

pub use endpoint::{TransactionQuery, query_transactions_endpoint};
pub use query::{TransactionFilter, query_transactions};
pub use view::{Transaction, TransactionKind};
