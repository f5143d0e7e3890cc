//! Database operations for categories.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, CategoryName},
    timestamp::Timestamp,
};

/// Initialize the category table.
///
/// Names are unique per user, not globally, and a category cannot be deleted while an expense or
/// income refers to it.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

/// Get the category called `name` for `user_id`, creating it if the user has never used it.
///
/// The insert and the fallback lookup are a single insert-or-fetch: if another caller creates
/// the same category first, the unique constraint turns the insert into a no-op and the existing
/// row is returned. This never reports [Error::NotFound].
///
/// # Errors
///
/// Returns an [Error::SqlError] if an SQL related error occurred.
pub fn resolve_category(
    user_id: UserID,
    name: &CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    let inserted = connection
        .prepare(
            "INSERT INTO category (user_id, name, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, name) DO NOTHING
             RETURNING id, user_id, name, created_at",
        )?
        .query_row(
            (user_id.as_i64(), name.as_ref(), Timestamp::now()),
            map_category_row,
        )
        .optional()?;

    match inserted {
        Some(category) => {
            tracing::debug!("Created category {:?} for user {user_id}", name.as_ref());
            Ok(category)
        }
        None => connection
            .prepare(
                "SELECT id, user_id, name, created_at FROM category
                 WHERE user_id = ?1 AND name = ?2",
            )?
            .query_row((user_id.as_i64(), name.as_ref()), map_category_row)
            .map_err(|error| error.into()),
    }
}

/// Look up the ID of the category called `name` for `user_id`.
///
/// Returns `None` if the user has never used the category. Unlike [resolve_category], this never
/// creates a category.
///
/// # Errors
///
/// Returns an [Error::SqlError] if an SQL related error occurred.
pub fn get_category_id_by_name(
    user_id: UserID,
    name: &CategoryName,
    connection: &Connection,
) -> Result<Option<CategoryId>, Error> {
    connection
        .prepare("SELECT id FROM category WHERE user_id = ?1 AND name = ?2")?
        .query_row((user_id.as_i64(), name.as_ref()), |row| row.get(0))
        .optional()
        .map_err(|error| error.into())
}

/// Retrieve all of a user's categories ordered alphabetically by name.
pub fn get_categories_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, created_at FROM category
             WHERE user_id = ?1 ORDER BY name ASC",
        )?
        .query_map([user_id.as_i64()], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Delete one of a user's categories.
///
/// # Errors
///
/// Returns an:
/// - [Error::NotFound] if the user has no category with `category_id`,
/// - [Error::CategoryInUse] if an expense or income still refers to the category,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn delete_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, user_id.as_i64()),
        )
        .map_err(|error| match error {
            // A referencing row blocks the delete: 787 is a plain FOREIGN KEY failure and 1811
            // is how SQLite reports an ON DELETE RESTRICT action.
            rusqlite::Error::SqliteFailure(sql_error, _)
                if matches!(sql_error.extended_code, 787 | 1811) =>
            {
                Error::CategoryInUse
            }
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: CategoryName::new_unchecked(&raw_name),
        created_at: row.get(3)?,
    })
}
