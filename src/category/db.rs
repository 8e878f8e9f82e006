//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName},
    user::UserID,
};

/// Create a category for `user_id` and return it with its generated ID.
///
/// # Errors
///
/// Returns an [Error::DuplicateCategoryName] if the user already has a
/// category called `name`.
pub fn create_category(
    user_id: UserID,
    name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (user_id, name) VALUES (?1, ?2);",
        (user_id.as_i64(), name.as_ref()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category { id, user_id, name })
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, user_id, name FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve the categories of `user_id` ordered alphabetically by name.
pub fn get_categories_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, user_id, name FROM category WHERE user_id = :user_id ORDER BY name ASC;")?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Fetch a category that `user_id` wants to change.
fn get_owned_category(
    category_id: CategoryId,
    user_id: UserID,
    missing: Error,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = match get_category(category_id, connection) {
        Ok(category) => category,
        Err(Error::NotFound) => return Err(missing),
        Err(error) => return Err(error),
    };

    if category.user_id != user_id {
        return Err(Error::Forbidden);
    }

    Ok(category)
}

/// Rename a category owned by `user_id`.
///
/// # Errors
///
/// Returns an [Error::UpdateMissing] if the category doesn't exist, an
/// [Error::Forbidden] if it belongs to another user, or an
/// [Error::DuplicateCategoryName] if the new name is taken.
pub fn rename_category(
    category_id: CategoryId,
    user_id: UserID,
    new_name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    get_owned_category(
        category_id,
        user_id,
        Error::UpdateMissing("category"),
        connection,
    )?;

    connection.execute(
        "UPDATE category SET name = ?1 WHERE id = ?2",
        (new_name.as_ref(), category_id),
    )?;

    Ok(Category {
        id: category_id,
        user_id,
        name: new_name,
    })
}

/// Delete a category owned by `user_id`.
///
/// Transactions in the category are kept and become uncategorized.
///
/// # Errors
///
/// Returns an [Error::DeleteMissing] if the category doesn't exist or an
/// [Error::Forbidden] if it belongs to another user.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    get_owned_category(
        category_id,
        user_id,
        Error::DeleteMissing("category"),
        connection,
    )?;

    connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            UNIQUE(user_id, name)
        );",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let raw_name: String = row.get(2)?;
    let name = CategoryName::new_unchecked(&raw_name);

    Ok(Category { id, user_id, name })
}
