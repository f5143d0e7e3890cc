//! Defines the expense model and its database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, CategoryName, resolve_category},
    database_id::DatabaseId,
    pagination::Pagination,
    timestamp::Timestamp,
};

/// Database identifier for an expense.
pub type ExpenseId = DatabaseId;

/// Money the user spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user that recorded the expense.
    pub user_id: UserID,
    /// How much was spent.
    pub amount: f64,
    /// The ID of the category the expense belongs to.
    pub category_id: CategoryId,
    /// The name of the category the expense belongs to.
    pub category: CategoryName,
    /// Free-text notes, empty if none were given.
    pub note: String,
    /// When the money was spent.
    pub date: Timestamp,
    /// When the expense was recorded.
    pub created_at: Timestamp,
    /// When the expense was last changed.
    pub updated_at: Timestamp,
}

/// The fields a client sends to create or update an expense.
///
/// `amount` is required for both. On create, a missing category means "uncategorized" and a
/// missing date means now. On update, every missing field keeps its stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    /// How much was spent.
    pub amount: Option<f64>,
    /// The category name, resolved to a category for the user.
    pub category: Option<String>,
    /// Free-text notes.
    pub note: Option<String>,
    /// When the money was spent.
    pub date: Option<Timestamp>,
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            category_id INTEGER NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
    )?;

    Ok(())
}

/// Record a new expense for `user_id`.
///
/// The category is resolved (and created if needed) in the same database transaction as the
/// insert, so a failed insert leaves no new category behind.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingAmount] if `input` has no amount,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(
    user_id: UserID,
    input: ExpenseInput,
    connection: &Connection,
) -> Result<Expense, Error> {
    let amount = input.amount.ok_or(Error::MissingAmount)?;
    let now = Timestamp::now();

    let transaction = connection.unchecked_transaction()?;

    let category = resolve_category(
        user_id,
        &CategoryName::from_optional(input.category.as_deref()),
        &transaction,
    )?;

    let id: ExpenseId = transaction
        .prepare(
            "INSERT INTO expense (user_id, amount, category_id, note, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                amount,
                category.id,
                input.note.unwrap_or_default(),
                input.date.unwrap_or(now),
                now,
            ),
            |row| row.get(0),
        )?;

    let expense = get_expense(user_id, id, &transaction)?;
    transaction.commit()?;

    Ok(expense)
}

/// Retrieve one of `user_id`'s expenses.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(user_id: UserID, id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .prepare(
            "SELECT e.id, e.user_id, e.amount, e.category_id, c.name, e.note, e.date,
                    e.created_at, e.updated_at
             FROM expense e
             INNER JOIN category c ON c.id = e.category_id
             WHERE e.id = ?1 AND e.user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_expense_row)
        .map_err(|error| error.into())
}

/// Update one of `user_id`'s expenses.
///
/// The amount must be given. The category, note and date keep their stored values when they are
/// missing from `input`. The update time is always refreshed.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingAmount] if `input` has no amount,
/// - [Error::NotFound] if `id` does not refer to an expense owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_expense(
    user_id: UserID,
    id: ExpenseId,
    input: ExpenseInput,
    connection: &Connection,
) -> Result<Expense, Error> {
    let amount = input.amount.ok_or(Error::MissingAmount)?;

    let transaction = connection.unchecked_transaction()?;

    let existing = get_expense(user_id, id, &transaction)?;

    let category_id = match input.category.as_deref() {
        Some(name) => resolve_category(user_id, &CategoryName::new(name), &transaction)?.id,
        None => existing.category_id,
    };

    transaction.execute(
        "UPDATE expense
         SET amount = ?1, category_id = ?2, note = ?3, date = ?4, updated_at = ?5
         WHERE id = ?6 AND user_id = ?7",
        (
            amount,
            category_id,
            input.note.unwrap_or(existing.note),
            input.date.unwrap_or(existing.date),
            Timestamp::now(),
            id,
            user_id.as_i64(),
        ),
    )?;

    let expense = get_expense(user_id, id, &transaction)?;
    transaction.commit()?;

    Ok(expense)
}

/// Delete one of `user_id`'s expenses.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_expense(user_id: UserID, id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Retrieve a page of `user_id`'s expenses, most recent first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_expenses_for_user(
    user_id: UserID,
    pagination: Pagination,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT e.id, e.user_id, e.amount, e.category_id, c.name, e.note, e.date,
                    e.created_at, e.updated_at
             FROM expense e
             INNER JOIN category c ON c.id = e.category_id
             WHERE e.user_id = ?1
             ORDER BY e.date DESC, e.id DESC
             LIMIT ?2 OFFSET ?3",
        )?
        .query_map(
            (
                user_id.as_i64(),
                pagination.sql_limit(),
                pagination.sql_offset(),
            ),
            map_expense_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// The total amount of all of `user_id`'s expenses, zero if there are none.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn sum_expenses_for_user(user_id: UserID, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expense WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let raw_category: String = row.get(4)?;

    Ok(Expense {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        category_id: row.get(3)?,
        category: CategoryName::new_unchecked(&raw_category),
        note: row.get(5)?,
        date: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod database_tests {
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        category::{CategoryName, get_categories_for_user},
        pagination::Pagination,
        test_utils::{create_test_user, get_test_connection},
        timestamp::Timestamp,
    };

    use super::{
        ExpenseInput, create_expense, delete_expense, get_expense, get_expenses_for_user,
        sum_expenses_for_user, update_expense,
    };

    fn input(amount: f64, category: &str, date: Timestamp) -> ExpenseInput {
        ExpenseInput {
            amount: Some(amount),
            category: Some(category.to_owned()),
            note: None,
            date: Some(date),
        }
    }

    #[test]
    fn create_without_date_uses_today_and_resolves_category() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);

        let expense = create_expense(
            user.id,
            ExpenseInput {
                amount: Some(42.50),
                category: Some("Food".to_owned()),
                note: Some("lunch".to_owned()),
                date: None,
            },
            &connection,
        )
        .expect("Could not create expense");

        assert!(expense.id > 0);
        assert_eq!(expense.user_id, user.id);
        assert_eq!(expense.amount, 42.50);
        assert_eq!(expense.category.as_ref(), "food");
        assert_eq!(expense.note, "lunch");
        assert_eq!(
            expense.date.as_offset_date_time().date(),
            OffsetDateTime::now_utc().date()
        );
        assert_eq!(expense.created_at, expense.updated_at);
    }

    #[test]
    fn create_without_category_is_uncategorized() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);

        let expense = create_expense(
            user.id,
            ExpenseInput {
                amount: Some(1.0),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(expense.category.as_ref(), CategoryName::UNCATEGORIZED);
        assert_eq!(expense.note, "");
    }

    #[test]
    fn create_without_amount_fails_and_writes_nothing() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);

        let result = create_expense(
            user.id,
            ExpenseInput {
                category: Some("food".to_owned()),
                ..Default::default()
            },
            &connection,
        );

        assert_eq!(result, Err(Error::MissingAmount));
        assert!(get_categories_for_user(user.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn get_returns_created_expense() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let created = create_expense(
            user.id,
            input(3.0, "food", Timestamp::from(datetime!(2024-01-10 12:00 UTC))),
            &connection,
        )
        .unwrap();

        let got = get_expense(user.id, created.id, &connection);

        assert_eq!(got, Ok(created));
    }

    #[test]
    fn get_other_users_expense_returns_not_found() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let expense = create_expense(bob.id, input(3.0, "food", Timestamp::now()), &connection)
            .unwrap();

        let got = get_expense(alice.id, expense.id, &connection);

        assert_eq!(got, Err(Error::NotFound));
    }

    #[test]
    fn update_with_only_amount_keeps_other_fields() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let date = Timestamp::from(datetime!(2024-01-10 12:00 UTC));
        let created = create_expense(
            user.id,
            ExpenseInput {
                amount: Some(10.0),
                category: Some("rent".to_owned()),
                note: Some("january".to_owned()),
                date: Some(date),
            },
            &connection,
        )
        .unwrap();

        let updated = update_expense(
            user.id,
            created.id,
            ExpenseInput {
                amount: Some(12.0),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.amount, 12.0);
        assert_eq!(updated.note, "january");
        assert_eq!(updated.category_id, created.category_id);
        assert_eq!(updated.category.as_ref(), "rent");
        assert_eq!(updated.date, date);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn update_changes_given_fields() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let created =
            create_expense(user.id, input(10.0, "rent", Timestamp::now()), &connection).unwrap();
        let new_date = Timestamp::from(datetime!(2023-06-01 08:00 UTC));

        let updated = update_expense(
            user.id,
            created.id,
            ExpenseInput {
                amount: Some(11.0),
                category: Some("Travel".to_owned()),
                note: Some("train".to_owned()),
                date: Some(new_date),
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.category.as_ref(), "travel");
        assert_ne!(updated.category_id, created.category_id);
        assert_eq!(updated.note, "train");
        assert_eq!(updated.date, new_date);
    }

    #[test]
    fn update_without_amount_is_rejected_and_changes_nothing() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let created =
            create_expense(user.id, input(10.0, "rent", Timestamp::now()), &connection).unwrap();

        let result = update_expense(
            user.id,
            created.id,
            ExpenseInput {
                note: Some("changed".to_owned()),
                category: Some("other".to_owned()),
                ..Default::default()
            },
            &connection,
        );

        assert_eq!(result, Err(Error::MissingAmount));
        assert_eq!(get_expense(user.id, created.id, &connection), Ok(created));
        assert_eq!(get_categories_for_user(user.id, &connection).unwrap().len(), 1);
    }

    #[test]
    fn update_other_users_expense_returns_not_found() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let created =
            create_expense(bob.id, input(10.0, "rent", Timestamp::now()), &connection).unwrap();

        let result = update_expense(
            alice.id,
            created.id,
            ExpenseInput {
                amount: Some(0.0),
                category: Some("stolen".to_owned()),
                ..Default::default()
            },
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(get_expense(bob.id, created.id, &connection), Ok(created));
        assert!(get_categories_for_user(alice.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn delete_removes_expense() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let created =
            create_expense(user.id, input(10.0, "rent", Timestamp::now()), &connection).unwrap();

        assert_eq!(delete_expense(user.id, created.id, &connection), Ok(()));
        assert_eq!(
            get_expense(user.id, created.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_missing_or_other_users_expense_returns_not_found() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let created =
            create_expense(bob.id, input(10.0, "rent", Timestamp::now()), &connection).unwrap();

        assert_eq!(
            delete_expense(alice.id, created.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_expense(alice.id, created.id + 100, &connection),
            Err(Error::NotFound)
        );
        assert!(get_expense(bob.id, created.id, &connection).is_ok());
    }

    #[test]
    fn list_is_paged_most_recent_first() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let other = create_test_user("bob", &connection);
        for day in 1..=5 {
            let date = Timestamp::from(
                datetime!(2024-01-01 12:00 UTC) + time::Duration::days(day - 1),
            );
            create_expense(user.id, input(day as f64, "food", date), &connection).unwrap();
        }
        create_expense(other.id, input(99.0, "food", Timestamp::now()), &connection).unwrap();

        let page = get_expenses_for_user(user.id, Pagination { limit: 2, offset: 1 }, &connection)
            .unwrap();

        let amounts: Vec<f64> = page.iter().map(|expense| expense.amount).collect();
        assert_eq!(amounts, [4.0, 3.0]);
    }

    #[test]
    fn sum_is_zero_without_expenses() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);

        assert_eq!(sum_expenses_for_user(user.id, &connection), Ok(0.0));
    }

    #[test]
    fn sum_only_counts_own_expenses() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        create_expense(alice.id, input(1.5, "food", Timestamp::now()), &connection).unwrap();
        create_expense(alice.id, input(2.5, "rent", Timestamp::now()), &connection).unwrap();
        create_expense(bob.id, input(100.0, "food", Timestamp::now()), &connection).unwrap();

        assert_eq!(sum_expenses_for_user(alice.id, &connection), Ok(4.0));
    }
}
