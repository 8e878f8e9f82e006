//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username or password did not match a registered user.
    ///
    /// The same error is used for both cases so that clients cannot learn
    /// which usernames are registered.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The request did not carry a valid, unexpired auth token.
    #[error("you must be logged in to access this resource")]
    NotAuthenticated,

    /// The user is logged in but is not allowed to perform the action, e.g.,
    /// sharing a budget owned by someone else.
    #[error("you do not have permission to perform this action")]
    Forbidden,

    /// An empty string was used as a username.
    #[error("username cannot be empty")]
    EmptyUsername,

    /// An empty string was used as a password.
    #[error("password cannot be empty")]
    EmptyPassword,

    /// An empty string was used as a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// A monetary amount was negative, too large or otherwise not usable.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The category ID used for a transaction does not refer to a category
    /// owned by the same user.
    #[error("the category ID {0} does not refer to one of your categories")]
    InvalidCategory(i64),

    /// A budget cannot be shared with its own owner.
    #[error("you cannot share a budget with yourself")]
    ShareWithSelf,

    /// A date could not be computed or was out of range.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The user a budget was to be shared with does not exist.
    #[error("the user to share with does not exist")]
    RecipientNotFound,

    /// Tried to update a record that does not exist.
    #[error("tried to update a {0} that is not in the database")]
    UpdateMissing(&'static str),

    /// Tried to delete a record that does not exist.
    #[error("tried to delete a {0} that is not in the database")]
    DeleteMissing(&'static str),

    /// The username is already taken.
    #[error("the username is already in use")]
    DuplicateUsername,

    /// The user already has a category with the same name.
    #[error("a category with this name already exists")]
    DuplicateCategoryName,

    /// The user already has a budget with the same frequency.
    #[error("a budget with this frequency already exists")]
    DuplicateBudgetFrequency,

    /// The budget has already been shared with the recipient.
    #[error("the budget is already shared with this user")]
    DuplicateShare,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The auth token could not be created or read.
    #[error("could not process the auth token: {0}")]
    TokenError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(ref sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 =>
            {
                if desc.ends_with("user.username") {
                    Error::DuplicateUsername
                } else if desc.ends_with("category.name") {
                    Error::DuplicateCategoryName
                } else if desc.ends_with("shared_budget.to_user_id") {
                    Error::DuplicateShare
                } else if desc.ends_with("budget.frequency") {
                    Error::DuplicateBudgetFrequency
                } else {
                    tracing::error!("an unhandled UNIQUE constraint failed: {}", desc);
                    Error::SqlError(value)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The HTTP status code for the error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyUsername
            | Error::EmptyPassword
            | Error::EmptyCategoryName
            | Error::InvalidAmount(_)
            | Error::InvalidCategory(_)
            | Error::ShareWithSelf
            | Error::InvalidDate(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound
            | Error::RecipientNotFound
            | Error::UpdateMissing(_)
            | Error::DeleteMissing(_) => StatusCode::NOT_FOUND,
            Error::DuplicateUsername
            | Error::DuplicateCategoryName
            | Error::DuplicateBudgetFrequency
            | Error::DuplicateShare => StatusCode::CONFLICT,
            Error::HashingError(_)
            | Error::TokenError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}
