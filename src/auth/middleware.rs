//! Authentication middleware that validates the token cookie and extends sessions.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    auth::cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
    user::{Role, UserID, get_user_by_id},
};

/// How far into the future each authenticated request pushes the token expiry.
const SESSION_EXTENSION: Duration = Duration::minutes(5);

/// The user that made the current request.
///
/// Inserted into the request extensions by [auth_guard], so route handlers
/// behind the guard can take `Extension(user): Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthenticatedUser {
    /// The ID of the logged in user.
    pub id: UserID,
    /// The role of the logged in user at the time of the request.
    pub role: Role,
}

impl AuthenticatedUser {
    /// Whether the user may manage other users.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection, used to check that the user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid auth token cookie.
///
/// If the token is valid and belongs to an existing user, an
/// [AuthenticatedUser] is placed into the request extensions and the request
/// is executed normally. Otherwise a 401 JSON error is returned.
///
/// On the way out, the token expiry is pushed forward so that active users
/// stay logged in.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::<Key>::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}");
            return Error::NotAuthenticated.into_response();
        }
    };

    let token = match get_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(error) => return error.into_response(),
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match get_user_by_id(token.user_id, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                tracing::info!("Rejected token for deleted user {}", token.user_id);
                return Error::NotAuthenticated.into_response();
            }
            Err(error) => return error.into_response(),
        }
    };

    parts.extensions.insert(AuthenticatedUser {
        id: user.id,
        role: user.role,
    });
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), SESSION_EXTENSION) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };

    // Handlers that set cookies themselves, e.g. log out, take precedence.
    if !parts.headers.contains_key(SET_COOKIE) {
        for (key, val) in jar.into_response().headers().iter() {
            if key != SET_COOKIE {
                continue;
            }

            parts.headers.append(key, val.to_owned());
        }
    }

    Response::from_parts(parts, body)
}
