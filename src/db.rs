//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    budget::{create_budget_table, create_shared_budget_table},
    category::create_category_table,
    transaction::create_transaction_table,
    user::create_user_table,
};

/// Enable foreign keys and create the tables for all of the domain models.
///
/// Foreign keys must be on for deletes to cascade from users and budgets, and
/// for deleted categories to be detached from their transactions.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    // The pragma is a no-op inside a transaction.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_shared_budget_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
