//! Core transaction domain types.

use serde::{Deserialize, Serialize, Serializer};
use time::{
    Date, OffsetDateTime, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};
use time_tz::Tz;

use crate::{
    Error, amount::Amount, category::CategoryId, database_id::DatabaseId, timezone::assume_local,
    user::UserID,
};

/// Database identifier for a transaction.
pub type TransactionId = DatabaseId;

/// An expense, i.e. an event where money was spent.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that spent the money.
    pub user_id: UserID,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent.
    pub amount: Amount,
    /// When the transaction happened, in UTC.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub date: OffsetDateTime,
    /// The category of the transaction, `None` if it has no category or
    /// its category was deleted.
    pub category_id: Option<CategoryId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: Amount, description: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            description: description.to_owned(),
            date: None,
            category_id: None,
        }
    }
}

/// A builder for creating and updating [Transaction]s.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The amount of money spent.
    pub amount: Amount,

    /// A human-readable description of the transaction.
    pub description: String,

    /// When the transaction happened.
    ///
    /// When creating a transaction, `None` means now. When updating a
    /// transaction, `None` keeps the stored date.
    pub date: Option<OffsetDateTime>,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    pub category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Set the date of the transaction.
    pub fn date(mut self, date: Option<OffsetDateTime>) -> Self {
        self.date = date;
        self
    }

    /// Set the category of the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }
}

/// Request body for creating and updating transactions.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    #[serde(default)]
    pub description: String,
    pub amount: Amount,
    /// An RFC 3339 date-time, or a plain date which is read as local midnight.
    pub date: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl TransactionForm {
    /// Validate the form and turn it into a [TransactionBuilder].
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidDate] if the date cannot be parsed.
    pub fn into_builder(self, timezone: &Tz) -> Result<TransactionBuilder, Error> {
        let date = self
            .date
            .as_deref()
            .map(|raw_date| parse_transaction_date(raw_date, timezone))
            .transpose()?;

        Ok(Transaction::build(self.amount, &self.description)
            .date(date)
            .category_id(self.category_id))
    }
}

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a transaction date sent by a client.
///
/// Full RFC 3339 date-times are used as is. A plain `YYYY-MM-DD` date is
/// taken to be midnight in `timezone`, with the offset in effect on that date.
pub fn parse_transaction_date(raw_date: &str, timezone: &Tz) -> Result<OffsetDateTime, Error> {
    let raw_date = raw_date.trim();

    if let Ok(date_time) = OffsetDateTime::parse(raw_date, &Rfc3339) {
        return Ok(date_time);
    }

    Date::parse(raw_date, DATE_FORMAT)
        .map(|date| assume_local(date.midnight(), timezone))
        .map_err(|_| {
            Error::InvalidDate(format!(
                "\"{raw_date}\" is neither an RFC 3339 date-time nor a YYYY-MM-DD date"
            ))
        })
}

fn serialize_rfc3339<S>(date: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let formatted = date.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}
