//! Filtering and paging the combined feed of expenses and incomes.

use rusqlite::{Connection, Row, named_params};

use crate::{
    Error,
    auth::UserID,
    category::{CategoryName, get_category_id_by_name},
    pagination::Pagination,
    timestamp::Timestamp,
};

use super::view::{Transaction, TransactionKind};

/// Optional constraints on the transaction feed. Every filter that is set must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Only transactions on or after this time.
    pub from: Option<Timestamp>,
    /// Only transactions on or before this time.
    pub to: Option<Timestamp>,
    /// Only transactions in this calendar month, 1 to 12.
    pub month: Option<u8>,
    /// Only transactions in this calendar year.
    pub year: Option<i32>,
    /// Only expenses or only incomes.
    pub kind: Option<TransactionKind>,
    /// Only transactions in the category with this name.
    pub category: Option<CategoryName>,
}

// Each half of the union applies the same nullable filters, a NULL parameter matches every row.
const TRANSACTION_QUERY: &str = "
    SELECT id, amount, category_id, category, note, source, type, date, created_at, updated_at
    FROM (
        SELECT e.id, e.amount, e.category_id, c.name AS category, e.note, NULL AS source,
               'expense' AS type, e.date, e.created_at, e.updated_at
        FROM expense e
        INNER JOIN category c ON c.id = e.category_id
        WHERE e.user_id = :user_id
          AND (:kind IS NULL OR :kind = 'expense')
          AND (:from IS NULL OR e.date >= :from)
          AND (:to IS NULL OR e.date <= :to)
          AND (:month IS NULL OR CAST(strftime('%m', e.date) AS INTEGER) = :month)
          AND (:year IS NULL OR CAST(strftime('%Y', e.date) AS INTEGER) = :year)
          AND (:category_id IS NULL OR e.category_id = :category_id)

        UNION ALL

        SELECT i.id, i.amount, i.category_id, c.name AS category, i.note, i.source,
               'income' AS type, i.date, i.created_at, i.updated_at
        FROM income i
        INNER JOIN category c ON c.id = i.category_id
        WHERE i.user_id = :user_id
          AND (:kind IS NULL OR :kind = 'income')
          AND (:from IS NULL OR i.date >= :from)
          AND (:to IS NULL OR i.date <= :to)
          AND (:month IS NULL OR CAST(strftime('%m', i.date) AS INTEGER) = :month)
          AND (:year IS NULL OR CAST(strftime('%Y', i.date) AS INTEGER) = :year)
          AND (:category_id IS NULL OR i.category_id = :category_id)
    )
    ORDER BY date DESC, type DESC, id DESC
    LIMIT :limit OFFSET :offset";

/// Get a page of `user_id`'s expenses and incomes as one feed, most recent first.
///
/// The filters are applied to both kinds of record before they are merged, and the page is taken
/// from the merged feed. Records with the same date are ordered incomes first, then by
/// descending ID, so paging is stable.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryNotFound] if the category filter names a category the user has never used,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn query_transactions(
    user_id: UserID,
    pagination: Pagination,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let category_id = match &filter.category {
        Some(name) => Some(
            get_category_id_by_name(user_id, name, connection)?.ok_or(Error::CategoryNotFound)?,
        ),
        None => None,
    };

    connection
        .prepare(TRANSACTION_QUERY)?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":kind": filter.kind.map(|kind| kind.as_str()),
                ":from": filter.from,
                ":to": filter.to,
                ":month": filter.month,
                ":year": filter.year,
                ":category_id": category_id,
                ":limit": pagination.sql_limit(),
                ":offset": pagination.sql_offset(),
            },
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_category: String = row.get(3)?;
    let raw_kind: String = row.get(6)?;
    let kind = match raw_kind.as_str() {
        "income" => TransactionKind::Income,
        _ => TransactionKind::Expense,
    };

    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        category_id: row.get(2)?,
        category: CategoryName::new_unchecked(&raw_category),
        note: row.get(4)?,
        source: row.get(5)?,
        kind,
        date: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
