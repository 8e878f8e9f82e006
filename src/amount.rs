//! Monetary amounts with two decimal places.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::Error;

/// An amount of money, rounded to cents.
///
/// Amounts are never negative: a transaction amount is an expense and a budget
/// amount is a spending ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "AmountValue", into = "AmountValue")]
pub struct Amount(Decimal);

/// The exclusive upper bound for amounts, the range of a `NUMERIC(10, 2)`.
fn max_amount() -> Decimal {
    Decimal::new(100_000_000, 0)
}

impl Amount {
    /// Zero dollars.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Create an amount, rounding to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAmount] if `value` is negative or is not
    /// smaller than 100,000,000.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        if value.is_sign_negative() && !value.is_zero() {
            return Err(Error::InvalidAmount(format!(
                "{value} is negative, amounts must be zero or greater"
            )));
        }

        if value >= max_amount() {
            return Err(Error::InvalidAmount(format!(
                "{value} is too large, amounts must be less than {}",
                max_amount()
            )));
        }

        Ok(Self(value.abs()))
    }

    /// Create an amount without validation.
    ///
    /// The caller should ensure that `value` is non-negative with at most two
    /// decimal places.
    pub fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// The amount as a decimal number.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|error| Error::InvalidAmount(format!("could not parse \"{s}\": {error}")))?;

        Amount::new(value)
    }
}

/// The JSON representation of an amount.
///
/// Clients send and receive plain JSON numbers.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct AmountValue(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl TryFrom<AmountValue> for Amount {
    type Error = Error;

    fn try_from(value: AmountValue) -> Result<Self, Self::Error> {
        Amount::new(value.0)
    }
}

impl From<Amount> for AmountValue {
    fn from(value: Amount) -> Self {
        AmountValue(value.0)
    }
}

// Amounts are stored as text so that no precision is lost to floating point.
impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        Decimal::from_str(text)
            .map(Amount::new_unchecked)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
