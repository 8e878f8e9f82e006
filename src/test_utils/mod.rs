//! Shared fixtures for unit tests.

use rusqlite::Connection;

use crate::{
    auth::PasswordHash,
    db::initialize,
    user::{Role, User, Username, create_user},
};

/// An in-memory database with all tables created and foreign keys enabled.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// Add a user with the password "pw123".
///
/// Uses the minimum bcrypt cost so that tests stay fast.
pub(crate) fn create_test_user(name: &str, role: Role, connection: &Connection) -> User {
    create_user(
        Username::new_unchecked(name),
        PasswordHash::from_raw_password("pw123", 4).expect("Could not hash password"),
        role,
        connection,
    )
    .expect("Could not create test user")
}
