//! Authentication: password hashing, the token cookie and the guard middleware.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod token;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use log_in::{LogInData, LogInResponse, LogInState, post_log_in};
pub use log_out::post_log_out;
pub use middleware::{AuthState, AuthenticatedUser, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub(crate) use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
