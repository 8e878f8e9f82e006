//! Core user domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A validated, non-empty username.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Hash)]
pub struct Username(String);

impl Username {
    /// Create a username, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an [Error::EmptyUsername] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyUsername)
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a username without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Username {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Username::new(s)
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a user is allowed to do.
///
/// Admins may list, edit and delete other users.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can manage other users.
    Admin,
    /// A regular user.
    #[default]
    User,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(FromSqlError::Other(
                format!("unknown role \"{other}\"").into(),
            )),
        }
    }
}

/// A user of the application.
///
/// The password hash is never serialized so that it cannot end up in a
/// response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: Username,
    /// What the user is allowed to do.
    pub role: Role,
    /// The user's password hash.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
}

#[cfg(test)]
mod username_tests {
    use crate::{Error, user::Username};

    #[test]
    fn new_fails_on_empty_string() {
        assert_eq!(Username::new(""), Err(Error::EmptyUsername));
    }

    #[test]
    fn new_trims_whitespace() {
        assert_eq!(Username::new("  alice\n").unwrap().as_ref(), "alice");
    }
}
