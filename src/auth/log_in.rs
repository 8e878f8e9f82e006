//! The log-in endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::cookie::set_auth_cookie,
    user::{Role, UserID, check_credentials, find_user_by_username},
};

/// The state needed for logging in a user.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent by the client to log in.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    /// The name of the account to log in to.
    pub username: String,
    /// Plaintext password, never logged.
    pub password: String,
}

/// Who was logged in.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LogInResponse {
    /// The ID of the logged in user.
    pub user_id: UserID,
    /// The role of the logged in user.
    pub role: Role,
}

/// Handler for log-in requests via the POST method.
///
/// On success, the auth cookie is set and the user's ID and role are returned.
///
/// # Errors
///
/// Returns an [Error::InvalidCredentials] for an unknown username or a wrong
/// password alike.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Json(user_data): Json<LogInData>,
) -> Result<(PrivateCookieJar, Json<LogInResponse>), Error> {
    let user = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        find_user_by_username(&user_data.username, &connection)?
    };

    // The bcrypt check must not hold the database lock or block an async worker.
    let raw_password = user_data.password;
    let user = tokio::task::spawn_blocking(move || check_credentials(user, &raw_password))
        .await
        .map_err(|error| {
            tracing::error!("password check task failed: {error}");
            Error::HashingError(error.to_string())
        })??;

    tracing::info!("User {} logged in", user.id);
    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;

    Ok((
        jar,
        Json(LogInResponse {
            user_id: user.id,
            role: user.role,
        }),
    ))
}
