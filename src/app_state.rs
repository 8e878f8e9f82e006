//! Shared state for the budgeting API's handlers.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize, timezone::get_timezone};

/// Everything the budgeting API's handlers need. Each module takes the parts
/// it uses through its own `FromRef` sub-state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Encrypts the session token cookie.
    pub cookie_key: Key,

    /// How long a session lasts without activity.
    pub cookie_duration: Duration,

    /// Decides where budget periods and plain transaction dates start, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The single connection to the budget database.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create the tables for users, categories, transactions, budgets and
    /// shares if needed, and wrap `db_connection` for the handlers.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezoneError] if `local_timezone` is not a
    /// canonical timezone name, or an [Error::SqlError] if the tables cannot
    /// be created.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        get_timezone(local_timezone)?;
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

// `PrivateCookieJar` reads the key from here.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the session cookie key from the `SECRET` setting.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::{Error, app_state::AppState, create_cookie_key};

    #[test]
    fn new_creates_tables() {
        let state =
            AppState::new(Connection::open_in_memory().unwrap(), "foobar", "Etc/UTC").unwrap();

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                    ('user', 'category', 'transaction', 'budget', 'shared_budget')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 5);
    }

    #[test]
    fn new_rejects_unknown_timezone() {
        let result = AppState::new(Connection::open_in_memory().unwrap(), "foobar", "Mars/Olympus");

        assert_eq!(
            result.err(),
            Some(Error::InvalidTimezoneError("Mars/Olympus".to_owned()))
        );
    }

    #[test]
    fn same_secret_gives_same_key() {
        assert_eq!(
            create_cookie_key("foobar").master(),
            create_cookie_key("foobar").master()
        );
        assert_ne!(
            create_cookie_key("foobar").master(),
            create_cookie_key("barfoo").master()
        );
    }
}
