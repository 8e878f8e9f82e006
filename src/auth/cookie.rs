//! Functions for storing the auth token in a private cookie.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::Token, user::UserID};

/// The name of the cookie holding the auth token.
pub(crate) const COOKIE_TOKEN: &str = "token";

/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(15);

fn build_token_cookie(value: String, expires_at: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((COOKIE_TOKEN, value))
        .path("/")
        .expires(expires_at)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// The token expires `duration` from the current time.
///
/// # Errors
///
/// Returns an [Error::TokenError] if the expiry overflows or the token cannot
/// be serialized.
pub(crate) fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::TokenError(format!("expiry overflowed for duration {duration}")))?;

    set_token(jar, Token { user_id, expires_at })
}

fn set_token(jar: PrivateCookieJar, token: Token) -> Result<PrivateCookieJar, Error> {
    let value =
        serde_json::to_string(&token).map_err(|error| Error::TokenError(error.to_string()))?;

    Ok(jar.add(build_token_cookie(value, token.expires_at)))
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub(crate) fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    let mut cookie = build_token_cookie("deleted".to_owned(), OffsetDateTime::UNIX_EPOCH);
    cookie.set_max_age(Duration::ZERO);

    jar.add(cookie)
}

/// Read the auth token from `jar`.
///
/// # Errors
///
/// Returns an [Error::NotAuthenticated] if the cookie is missing, could not
/// be decrypted, does not hold a token or holds an expired token.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::NotAuthenticated)?;

    let token: Token = serde_json::from_str(cookie.value_trimmed()).map_err(|error| {
        tracing::debug!("could not parse auth token: {error}");
        Error::NotAuthenticated
    })?;

    if token.is_expired(OffsetDateTime::now_utc()) {
        return Err(Error::NotAuthenticated);
    }

    Ok(token)
}

/// Push the token expiry out to the later of its current expiry and `duration`
/// from now.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;

    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::TokenError(format!("expiry overflowed for duration {duration}")))?;

    set_token(
        jar,
        Token {
            user_id: token.user_id,
            expires_at: max(token.expires_at, new_expiry),
        },
    )
}
