//! Password validation and hashing.
//!
//! `ValidatedPassword` wraps a string that is acceptable as a password.
//! `PasswordHash` turns a `ValidatedPassword` into a salted bcrypt hash.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};

use crate::Error;

/// A password that has been validated, but not yet hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Validate a plaintext password.
    ///
    /// # Errors
    ///
    /// Returns an [Error::EmptyPassword] if the password is empty or only
    /// whitespace.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        if raw_password.trim().is_empty() {
            return Err(Error::EmptyPassword);
        }

        Ok(Self(raw_password.to_owned()))
    }

    /// Create a new `ValidatedPassword` without any validation.
    ///
    /// The caller should ensure that `raw_password` is not empty.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

// Never print the plaintext.
impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash a validated password with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to
    /// verify a password. Pass in [PasswordHash::DEFAULT_COST] unless you are
    /// writing a test.
    ///
    /// # Errors
    ///
    /// Returns an [Error::HashingError] if the password could not be hashed.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Create a new `PasswordHash` from a hash string without any validation.
    ///
    /// The caller should ensure that `raw_password_hash` came from
    /// [PasswordHash::new], e.g., it was read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Validate and hash a plaintext password in one step.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        let validated_password = ValidatedPassword::new(raw_password)?;
        PasswordHash::new(validated_password, cost)
    }

    /// Check that `raw_password` matches the stored password.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod validated_password_tests {
    use crate::{Error, auth::ValidatedPassword};

    #[test]
    fn new_fails_on_empty() {
        assert_eq!(ValidatedPassword::new(""), Err(Error::EmptyPassword));
    }

    #[test]
    fn new_fails_on_whitespace() {
        assert_eq!(ValidatedPassword::new(" \t\n"), Err(Error::EmptyPassword));
    }

    #[test]
    fn new_accepts_short_password() {
        assert!(ValidatedPassword::new("pw123").is_ok());
    }

    #[test]
    fn display_masks_password() {
        let password = ValidatedPassword::new_unchecked("hunter2");

        assert_eq!(password.to_string(), "********");
    }
}

#[cfg(test)]
mod password_hash_tests {
    use crate::auth::{PasswordHash, ValidatedPassword};

    #[test]
    fn verify_succeeds_for_matching_password() {
        let hash = PasswordHash::new(ValidatedPassword::new_unchecked("pw123"), 4).unwrap();

        assert!(hash.verify("pw123").unwrap());
    }

    #[test]
    fn verify_fails_for_different_password() {
        let hash = PasswordHash::new(ValidatedPassword::new_unchecked("pw123"), 4).unwrap();

        assert!(!hash.verify("wrong").unwrap());
    }

    #[test]
    fn hash_is_salted() {
        let first = PasswordHash::from_raw_password("pw123", 4).unwrap();
        let second = PasswordHash::from_raw_password("pw123", 4).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn hash_does_not_contain_plaintext() {
        let hash = PasswordHash::from_raw_password("pw123", 4).unwrap();

        assert!(!hash.as_ref().contains("pw123"));
    }
}
