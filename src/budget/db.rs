//! Database operations for budgets.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    budget::{Budget, BudgetId, NewBudget},
    user::UserID,
};

/// Create a budget for `user_id` and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateBudgetFrequency] if the user already has a budget with the same frequency,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    user_id: UserID,
    new_budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = connection
        .prepare(
            "INSERT INTO budget (user_id, frequency, amount, period) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, user_id, frequency, amount, period",
        )?
        .query_row(
            (
                user_id.as_i64(),
                new_budget.frequency,
                new_budget.amount,
                new_budget.period,
            ),
            map_budget_row,
        )?;

    Ok(budget)
}

/// Retrieve a budget by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid budget,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_budget(id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    let budget = connection
        .prepare("SELECT id, user_id, frequency, amount, period FROM budget WHERE id = :id")?
        .query_row(&[(":id", &id)], map_budget_row)?;

    Ok(budget)
}

/// Retrieve a budget that `user_id` may read: one they own or one shared with them.
///
/// # Errors
/// Returns an [Error::NotFound] if the budget doesn't exist or an
/// [Error::Forbidden] if the user can't see it.
pub fn get_readable_budget(
    id: BudgetId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = get_budget(id, connection)?;

    if budget.user_id == user_id {
        return Ok(budget);
    }

    let is_shared: bool = connection.query_row(
        "SELECT EXISTS(SELECT 1 FROM shared_budget WHERE budget_id = ?1 AND to_user_id = ?2)",
        (id, user_id.as_i64()),
        |row| row.get(0),
    )?;

    if is_shared {
        Ok(budget)
    } else {
        Err(Error::Forbidden)
    }
}

/// Retrieve the budgets owned by `user_id`, weekly first.
pub fn get_budgets_for_user(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, frequency, amount, period FROM budget
             WHERE user_id = :user_id
             ORDER BY CASE frequency WHEN 'weekly' THEN 0 WHEN 'monthly' THEN 1 ELSE 2 END",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_budget_row)?
        .map(|maybe_budget| maybe_budget.map_err(|error| error.into()))
        .collect()
}

pub(super) fn get_owned_budget(
    id: BudgetId,
    user_id: UserID,
    missing: Error,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = match get_budget(id, connection) {
        Ok(budget) => budget,
        Err(Error::NotFound) => return Err(missing),
        Err(error) => return Err(error),
    };

    if budget.user_id != user_id {
        return Err(Error::Forbidden);
    }

    Ok(budget)
}

/// Replace the fields of a budget owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissing] if the budget does not exist,
/// - [Error::Forbidden] if it belongs to another user,
/// - or [Error::DuplicateBudgetFrequency] if the user already has another budget with the new frequency.
pub fn update_budget(
    id: BudgetId,
    user_id: UserID,
    new_budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    get_owned_budget(id, user_id, Error::UpdateMissing("budget"), connection)?;

    let budget = connection
        .prepare(
            "UPDATE budget SET frequency = ?1, amount = ?2, period = ?3 WHERE id = ?4
             RETURNING id, user_id, frequency, amount, period",
        )?
        .query_row(
            (
                new_budget.frequency,
                new_budget.amount,
                new_budget.period,
                id,
            ),
            map_budget_row,
        )?;

    Ok(budget)
}

/// Delete a budget owned by `user_id` along with all of its shares.
///
/// # Errors
/// Returns an [Error::DeleteMissing] if the budget doesn't exist or an
/// [Error::Forbidden] if it belongs to another user.
pub fn delete_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    get_owned_budget(id, user_id, Error::DeleteMissing("budget"), connection)?;

    connection.execute("DELETE FROM budget WHERE id = ?1", [id])?;

    Ok(())
}

/// Initialize the budget table.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            frequency TEXT NOT NULL CHECK (frequency IN ('weekly', 'monthly', 'yearly')),
            amount TEXT NOT NULL,
            period TEXT NOT NULL,
            UNIQUE(user_id, frequency)
        );",
    )?;

    Ok(())
}

pub(super) fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        frequency: row.get(2)?,
        amount: row.get(3)?,
        period: row.get(4)?,
    })
}
