//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, auth::create_user_table, category::create_category_table,
    expense::create_expense_table, income::create_income_table,
};

/// Create all the tables for the application's domain models.
///
/// Foreign key enforcement is switched on for `connection` first, since category deletion relies
/// on it to refuse removing categories that are still in use.
///
/// # Errors
/// Returns an error if a table could not be created or the transaction could not be committed.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_income_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
