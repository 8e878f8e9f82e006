//! Granting other users read access to a budget.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    budget::{
        Budget, BudgetId, SharedBudget, ShareId,
        db::{get_owned_budget, map_budget_row},
    },
    user::{UserID, get_user_by_id},
};

/// Share a budget owned by `from_user_id` with `to_user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the budget does not exist,
/// - [Error::Forbidden] if `from_user_id` does not own the budget,
/// - [Error::ShareWithSelf] if the recipient is the owner,
/// - [Error::RecipientNotFound] if the recipient is not a registered user,
/// - or [Error::DuplicateShare] if the budget is already shared with the recipient.
pub fn share_budget(
    budget_id: BudgetId,
    from_user_id: UserID,
    to_user_id: UserID,
    connection: &Connection,
) -> Result<SharedBudget, Error> {
    get_owned_budget(budget_id, from_user_id, Error::NotFound, connection)?;

    if from_user_id == to_user_id {
        return Err(Error::ShareWithSelf);
    }

    match get_user_by_id(to_user_id, connection) {
        Ok(_) => {}
        Err(Error::NotFound) => return Err(Error::RecipientNotFound),
        Err(error) => return Err(error),
    }

    let share = connection
        .prepare(
            "INSERT INTO shared_budget (budget_id, from_user_id, to_user_id) VALUES (?1, ?2, ?3)
             RETURNING id, budget_id, from_user_id, to_user_id",
        )?
        .query_row(
            (budget_id, from_user_id.as_i64(), to_user_id.as_i64()),
            map_share_row,
        )?;

    Ok(share)
}

/// Retrieve the budgets other users have shared with `user_id`.
pub fn get_budgets_shared_with(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT budget.id, budget.user_id, budget.frequency, budget.amount, budget.period
             FROM budget
             INNER JOIN shared_budget ON shared_budget.budget_id = budget.id
             WHERE shared_budget.to_user_id = :user_id
             ORDER BY budget.id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_budget_row)?
        .map(|maybe_budget| maybe_budget.map_err(|error| error.into()))
        .collect()
}

/// Retrieve who a budget has been shared with.
///
/// Only the owner of the budget may list its shares.
pub fn get_shares_for_budget(
    budget_id: BudgetId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<SharedBudget>, Error> {
    get_owned_budget(budget_id, user_id, Error::NotFound, connection)?;

    connection
        .prepare(
            "SELECT id, budget_id, from_user_id, to_user_id FROM shared_budget
             WHERE budget_id = :budget_id ORDER BY id ASC",
        )?
        .query_map(&[(":budget_id", &budget_id)], map_share_row)?
        .map(|maybe_share| maybe_share.map_err(|error| error.into()))
        .collect()
}

fn get_share(id: ShareId, connection: &Connection) -> Result<SharedBudget, Error> {
    let share = connection
        .prepare("SELECT id, budget_id, from_user_id, to_user_id FROM shared_budget WHERE id = :id")?
        .query_row(&[(":id", &id)], map_share_row)?;

    Ok(share)
}

/// Revoke a share granted by `user_id`.
///
/// # Errors
/// Returns an [Error::DeleteMissing] if the share doesn't exist or an
/// [Error::Forbidden] if it was granted by another user.
pub fn unshare_budget(id: ShareId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let share = match get_share(id, connection) {
        Ok(share) => share,
        Err(Error::NotFound) => return Err(Error::DeleteMissing("budget share")),
        Err(error) => return Err(error),
    };

    if share.from_user_id != user_id {
        return Err(Error::Forbidden);
    }

    connection.execute("DELETE FROM shared_budget WHERE id = ?1", [id])?;

    Ok(())
}

/// Initialize the shared budget table.
///
/// Shares are removed with their budget and with either user.
pub fn create_shared_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS shared_budget (
            id INTEGER PRIMARY KEY,
            budget_id INTEGER NOT NULL REFERENCES budget(id) ON DELETE CASCADE,
            from_user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            to_user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            UNIQUE(budget_id, to_user_id)
        );",
    )?;

    Ok(())
}

fn map_share_row(row: &Row) -> Result<SharedBudget, rusqlite::Error> {
    Ok(SharedBudget {
        id: row.get(0)?,
        budget_id: row.get(1)?,
        from_user_id: UserID::new(row.get(2)?),
        to_user_id: UserID::new(row.get(3)?),
    })
}
