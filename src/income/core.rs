//! Defines the income model and its database queries.

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

/// Database identifier for an income.
pub type IncomeId = DatabaseId;

/// Money the user earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Income {
    /// The ID of the income.
    pub id: IncomeId,
    /// The user that recorded the income.
    pub user_id: UserID,
    /// How much was earned.
    pub amount: f64,
    /// The ID of the category the income belongs to.
    pub category_id: CategoryId,
    /// The name of the category the income belongs to.
    pub category: CategoryName,
    /// Where the money came from, e.g. an employer. Empty if not given.
    pub source: String,
    /// Free-text notes, empty if none were given.
    pub note: String,
    /// When the money was received.
    pub date: Timestamp,
    /// When the income was recorded.
    pub created_at: Timestamp,
    /// When the income was last changed.
    pub updated_at: Timestamp,
}

/// The fields a client sends to create or update an income.
///
/// Follows the same rules as [crate::expense::ExpenseInput], with `source` treated like `note`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeInput {
    /// How much was earned.
    pub amount: Option<f64>,
    /// The category name, resolved to a category for the user.
    pub category: Option<String>,
    /// Where the money came from.
    pub source: Option<String>,
    /// Free-text notes.
    pub note: Option<String>,
    /// When the money was received.
    pub date: Option<Timestamp>,
}

/// Create the income table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_income_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS income (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            category_id INTEGER NOT NULL,
            source TEXT NOT NULL DEFAULT '',
            note TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_income_user_date ON income(user_id, date);",
    )?;

    Ok(())
}

/// Record a new income for `user_id`.
///
/// The category is resolved in the same database transaction as the insert.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingAmount] if `input` has no amount,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_income(
    user_id: UserID,
    input: IncomeInput,
    connection: &Connection,
) -> Result<Income, Error> {
    let amount = input.amount.ok_or(Error::MissingAmount)?;
    let now = Timestamp::now();

    let transaction = connection.unchecked_transaction()?;

    let category = resolve_category(
        user_id,
        &CategoryName::from_optional(input.category.as_deref()),
        &transaction,
    )?;

    let id: IncomeId = transaction
        .prepare(
            "INSERT INTO income
                (user_id, amount, category_id, source, note, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                amount,
                category.id,
                input.source.unwrap_or_default(),
                input.note.unwrap_or_default(),
                input.date.unwrap_or(now),
                now,
            ),
            |row| row.get(0),
        )?;

    let income = get_income(user_id, id, &transaction)?;
    transaction.commit()?;

    Ok(income)
}

/// Retrieve one of `user_id`'s incomes.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an income owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_income(user_id: UserID, id: IncomeId, connection: &Connection) -> Result<Income, Error> {
    connection
        .prepare(
            "SELECT i.id, i.user_id, i.amount, i.category_id, c.name, i.source, i.note, i.date,
                    i.created_at, i.updated_at
             FROM income i
             INNER JOIN category c ON c.id = i.category_id
             WHERE i.id = ?1 AND i.user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_income_row)
        .map_err(|error| error.into())
}

/// Update one of `user_id`'s incomes.
///
/// The amount must be given. Every other field keeps its stored value when it is missing from
/// `input`. The update time is always refreshed.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingAmount] if `input` has no amount,
/// - [Error::NotFound] if `id` does not refer to an income owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_income(
    user_id: UserID,
    id: IncomeId,
    input: IncomeInput,
    connection: &Connection,
) -> Result<Income, Error> {
    let amount = input.amount.ok_or(Error::MissingAmount)?;

    let transaction = connection.unchecked_transaction()?;

    let existing = get_income(user_id, id, &transaction)?;

    let category_id = match input.category.as_deref() {
        Some(name) => resolve_category(user_id, &CategoryName::new(name), &transaction)?.id,
        None => existing.category_id,
    };

    transaction.execute(
        "UPDATE income
         SET amount = ?1, category_id = ?2, source = ?3, note = ?4, date = ?5, updated_at = ?6
         WHERE id = ?7 AND user_id = ?8",
        (
            amount,
            category_id,
            input.source.unwrap_or(existing.source),
            input.note.unwrap_or(existing.note),
            input.date.unwrap_or(existing.date),
            Timestamp::now(),
            id,
            user_id.as_i64(),
        ),
    )?;

    let income = get_income(user_id, id, &transaction)?;
    transaction.commit()?;

    Ok(income)
}

/// Delete one of `user_id`'s incomes.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an income owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_income(user_id: UserID, id: IncomeId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM income WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Retrieve a page of `user_id`'s incomes, most recent first.
pub fn get_incomes_for_user(
    user_id: UserID,
    pagination: Pagination,
    connection: &Connection,
) -> Result<Vec<Income>, Error> {
    connection
        .prepare(
            "SELECT i.id, i.user_id, i.amount, i.category_id, c.name, i.source, i.note, i.date,
                    i.created_at, i.updated_at
             FROM income i
             INNER JOIN category c ON c.id = i.category_id
             WHERE i.user_id = ?1
             ORDER BY i.date DESC, i.id DESC
             LIMIT ?2 OFFSET ?3",
        )?
        .query_map(
            (
                user_id.as_i64(),
                pagination.sql_limit(),
                pagination.sql_offset(),
            ),
            map_income_row,
        )?
        .map(|maybe_income| maybe_income.map_err(|error| error.into()))
        .collect()
}

/// The total amount of all of `user_id`'s incomes, zero if there are none.
pub fn sum_incomes_for_user(user_id: UserID, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM income WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_income_row(row: &Row) -> Result<Income, rusqlite::Error> {
    let raw_category: String = row.get(4)?;

    Ok(Income {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        category_id: row.get(3)?,
        category: CategoryName::new_unchecked(&raw_category),
        source: row.get(5)?,
        note: row.get(6)?,
        date: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod database_tests {
    use time::macros::datetime;

    use crate::{
        Error,
        category::CategoryName,
        pagination::Pagination,
        test_utils::{create_test_user, get_test_connection},
        timestamp::Timestamp,
    };

    use super::{
        IncomeInput, create_income, delete_income, get_income, get_incomes_for_user,
        sum_incomes_for_user, update_income,
    };

    fn salary(amount: f64, date: Timestamp) -> IncomeInput {
        IncomeInput {
            amount: Some(amount),
            category: Some("Salary".to_owned()),
            source: Some("Acme".to_owned()),
            note: None,
            date: Some(date),
        }
    }

    #[test]
    fn create_stores_source_and_resolves_category() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let date = Timestamp::from(datetime!(2024-01-15 09:00 UTC));

        let income = create_income(user.id, salary(5000.0, date), &connection).unwrap();

        assert!(income.id > 0);
        assert_eq!(income.source, "Acme");
        assert_eq!(income.category.as_ref(), "salary");
        assert_eq!(income.date, date);
        assert_eq!(income.note, "");
    }

    #[test]
    fn create_without_optional_fields_uses_defaults() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);

        let income = create_income(
            user.id,
            IncomeInput {
                amount: Some(1.0),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(income.source, "");
        assert_eq!(income.category.as_ref(), CategoryName::UNCATEGORIZED);
    }

    #[test]
    fn create_without_amount_fails() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);

        let result = create_income(user.id, IncomeInput::default(), &connection);

        assert_eq!(result, Err(Error::MissingAmount));
    }

    #[test]
    fn update_with_only_amount_keeps_other_fields() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let date = Timestamp::from(datetime!(2024-01-15 09:00 UTC));
        let created = create_income(user.id, salary(5000.0, date), &connection).unwrap();

        let updated = update_income(
            user.id,
            created.id,
            IncomeInput {
                amount: Some(5500.0),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.amount, 5500.0);
        assert_eq!(updated.source, "Acme");
        assert_eq!(updated.category_id, created.category_id);
        assert_eq!(updated.date, date);
    }

    #[test]
    fn update_changes_source() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let created = create_income(user.id, salary(5000.0, Timestamp::now()), &connection).unwrap();

        let updated = update_income(
            user.id,
            created.id,
            IncomeInput {
                amount: Some(5000.0),
                source: Some("Initech".to_owned()),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.source, "Initech");
    }

    #[test]
    fn update_without_amount_is_rejected() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let created = create_income(user.id, salary(5000.0, Timestamp::now()), &connection).unwrap();

        let result = update_income(
            user.id,
            created.id,
            IncomeInput {
                source: Some("Initech".to_owned()),
                ..Default::default()
            },
            &connection,
        );

        assert_eq!(result, Err(Error::MissingAmount));
        assert_eq!(get_income(user.id, created.id, &connection), Ok(created));
    }

    #[test]
    fn other_users_income_is_not_found() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let created = create_income(bob.id, salary(10.0, Timestamp::now()), &connection).unwrap();

        assert_eq!(
            get_income(alice.id, created.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            update_income(
                alice.id,
                created.id,
                IncomeInput {
                    amount: Some(1.0),
                    ..Default::default()
                },
                &connection
            ),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_income(alice.id, created.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(get_income(bob.id, created.id, &connection), Ok(created));
    }

    #[test]
    fn delete_removes_income() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let created = create_income(user.id, salary(10.0, Timestamp::now()), &connection).unwrap();

        assert_eq!(delete_income(user.id, created.id, &connection), Ok(()));
        assert_eq!(
            delete_income(user.id, created.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn list_is_paged_most_recent_first() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        for month in 1..=4u8 {
            let date = Timestamp::from(
                datetime!(2024-01-01 00:00 UTC).replace_month(month.try_into().unwrap()).unwrap(),
            );
            create_income(user.id, salary(f64::from(month), date), &connection).unwrap();
        }

        let page =
            get_incomes_for_user(user.id, Pagination { limit: 3, offset: 0 }, &connection).unwrap();

        let amounts: Vec<f64> = page.iter().map(|income| income.amount).collect();
        assert_eq!(amounts, [4.0, 3.0, 2.0]);
    }

    #[test]
    fn sum_is_zero_without_incomes() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);

        assert_eq!(sum_incomes_for_user(user.id, &connection), Ok(0.0));
    }

    #[test]
    fn sum_adds_own_incomes() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        create_income(alice.id, salary(100.0, Timestamp::now()), &connection).unwrap();
        create_income(alice.id, salary(50.5, Timestamp::now()), &connection).unwrap();
        create_income(bob.id, salary(7.0, Timestamp::now()), &connection).unwrap();

        assert_eq!(sum_incomes_for_user(alice.id, &connection), Ok(150.5));
    }
}
