//! The read-only transaction feed that merges expenses and incomes.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Error, category::CategoryId, category::CategoryName, database_id::DatabaseId,
    timestamp::Timestamp,
};

/// Which table a [Transaction] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money spent.
    Expense,
    /// Money earned.
    Income,
}

impl TransactionKind {
    /// The name used in queries and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(TransactionKind::Expense),
            "income" => Ok(TransactionKind::Income),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expense or income as it appears in the combined feed.
///
/// The `id` is only unique together with `type`, since expenses and incomes are numbered
/// separately.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the underlying expense or income.
    pub id: DatabaseId,
    /// How much was spent or earned.
    pub amount: f64,
    /// The ID of the category the record belongs to.
    pub category_id: CategoryId,
    /// The name of the category the record belongs to.
    pub category: CategoryName,
    /// Free-text notes.
    pub note: String,
    /// Where an income came from. Always `None` for expenses.
    pub source: Option<String>,
    /// Whether this is an expense or an income.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// When the money moved.
    pub date: Timestamp,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record was last changed.
    pub updated_at: Timestamp,
}
