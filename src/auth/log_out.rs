//! The log-out endpoint.

use axum::http::StatusCode;
use axum_extra::extract::PrivateCookieJar;

use crate::auth::cookie::invalidate_auth_cookie;

/// Invalidate the auth cookie, logging the user out.
pub async fn post_log_out(jar: PrivateCookieJar) -> (StatusCode, PrivateCookieJar) {
    (StatusCode::NO_CONTENT, invalidate_auth_cookie(jar))
}
