//! Database operations for users.

use std::sync::LazyLock;

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    auth::PasswordHash,
    user::{Role, User, UserID, Username},
};

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('admin', 'user'))
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::DuplicateUsername] if the username is taken or a
/// [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    username: Username,
    password_hash: PasswordHash,
    role: Role,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (username, password, role) VALUES (?1, ?2, ?3)",
        (username.as_ref(), password_hash.as_ref(), role),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username,
        role,
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the database.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password, role FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user with the username `username`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if no user has that username.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password, role FROM user WHERE username = :username")?
        .query_row(&[(":username", &username.trim())], map_row)
        .map_err(|error| error.into())
}

/// Get all users ordered by ID.
pub fn get_all_users(connection: &Connection) -> Result<Vec<User>, Error> {
    connection
        .prepare("SELECT id, username, password, role FROM user ORDER BY id ASC")?
        .query_map([], map_row)?
        .map(|maybe_user| maybe_user.map_err(|error| error.into()))
        .collect()
}

/// Rename a user and/or change their role, leaving `None` fields unchanged.
///
/// # Errors
///
/// Returns an [Error::UpdateMissing] if the user does not exist or an
/// [Error::DuplicateUsername] if the new username is taken.
pub fn update_user(
    user_id: UserID,
    username: Option<Username>,
    role: Option<Role>,
    connection: &Connection,
) -> Result<User, Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET username = COALESCE(?1, username), role = COALESCE(?2, role)
        WHERE id = ?3",
        (
            username.as_ref().map(|username| username.as_ref()),
            role,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("user"));
    }

    get_user_by_id(user_id, connection)
}

/// Replace a user's password hash.
///
/// # Errors
///
/// Returns an [Error::UpdateMissing] if the user does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("user"));
    }

    Ok(())
}

/// Delete a user along with their categories, transactions, budgets and
/// budget shares.
///
/// # Errors
///
/// Returns an [Error::DeleteMissing] if the user does not exist.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM user WHERE id = ?1", [user_id.as_i64()])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissing("user"));
    }

    Ok(())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Hash checked when the username is unknown, so that rejecting an unknown
/// user costs as much as rejecting a wrong password.
static UNKNOWN_USER_HASH: LazyLock<Option<PasswordHash>> = LazyLock::new(|| {
    PasswordHash::from_raw_password("unknown user", PasswordHash::DEFAULT_COST).ok()
});

/// Check a username and plaintext password against the stored hash.
///
/// # Errors
///
/// Returns an [Error::InvalidCredentials] if the user does not exist or the
/// password does not match. The two cases are not distinguished.
pub fn verify_credentials(
    username: &str,
    raw_password: &str,
    connection: &Connection,
) -> Result<User, Error> {
    let user = find_user_by_username(username, connection)?;

    check_credentials(user, raw_password)
}

/// Get a user by their username, or `None` if there is no such user.
pub fn find_user_by_username(
    username: &str,
    connection: &Connection,
) -> Result<Option<User>, Error> {
    match get_user_by_username(username, connection) {
        Ok(user) => Ok(Some(user)),
        Err(Error::NotFound) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Check `raw_password` against the hash of a user found by
/// [find_user_by_username].
///
/// A bcrypt check runs whether or not `user` exists. It does not touch the
/// database, so it can run without holding the connection lock.
///
/// # Errors
///
/// Returns an [Error::InvalidCredentials] if `user` is `None` or the password
/// does not match.
pub fn check_credentials(user: Option<User>, raw_password: &str) -> Result<User, Error> {
    let Some(user) = user else {
        if let Some(hash) = UNKNOWN_USER_HASH.as_ref() {
            let _ = hash.verify(raw_password);
        }

        return Err(Error::InvalidCredentials);
    };

    match user.password_hash.verify(raw_password) {
        Ok(true) => Ok(user),
        Ok(false) => Err(Error::InvalidCredentials),
        Err(error) => Err(Error::HashingError(error.to_string())),
    }
}

/// Create an admin account unless a user named `username` already exists.
///
/// Returns the new admin, or `None` if the username was already taken.
pub fn bootstrap_admin(
    username: &str,
    raw_password: &str,
    cost: u32,
    connection: &Connection,
) -> Result<Option<User>, Error> {
    let username = Username::new(username)?;

    let existing = connection
        .query_row(
            "SELECT id FROM user WHERE username = ?1",
            [username.as_ref()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    if existing.is_some() {
        return Ok(None);
    }

    let password_hash = PasswordHash::from_raw_password(raw_password, cost)?;

    create_user(username, password_hash, Role::Admin, connection).map(Some)
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = UserID::new(row.get(0)?);
    let raw_username: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;
    let role = row.get(3)?;

    Ok(User {
        id,
        username: Username::new_unchecked(&raw_username),
        role,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
