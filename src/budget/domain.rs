//! Core budget and budget sharing domain types.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{amount::Amount, database_id::DatabaseId, user::UserID};

/// Database identifier for a budget.
pub type BudgetId = DatabaseId;

/// Database identifier for a budget share.
pub type ShareId = DatabaseId;

/// How often a budget resets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Resets every Monday.
    Weekly,
    /// Resets on the first day of each month.
    Monthly,
    /// Resets on the first of January.
    Yearly,
}

impl Frequency {
    fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(FromSqlError::Other(
                format!("unknown budget frequency \"{other}\"").into(),
            )),
        }
    }
}

/// A spending ceiling that resets every period.
///
/// A user has at most one budget per [Frequency].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    pub id: BudgetId,
    /// The user that owns the budget.
    pub user_id: UserID,
    pub frequency: Frequency,
    /// How much may be spent each period.
    pub amount: Amount,
    /// The date the budget was set up for.
    pub period: Date,
}

/// The fields needed to create or replace a budget.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub frequency: Frequency,
    pub amount: Amount,
    pub period: Date,
}

/// Request body for creating and updating budgets.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetForm {
    pub frequency: Frequency,
    pub amount: Amount,
    /// Defaults to today in the server's timezone.
    pub period: Option<Date>,
}

impl BudgetForm {
    /// Fill in the default period.
    pub fn into_new_budget(self, today: Date) -> NewBudget {
        NewBudget {
            frequency: self.frequency,
            amount: self.amount,
            period: self.period.unwrap_or(today),
        }
    }
}

/// Read access to a budget granted by its owner to another user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedBudget {
    pub id: ShareId,
    pub budget_id: BudgetId,
    /// The owner of the budget.
    pub from_user_id: UserID,
    /// The user who may read the budget.
    pub to_user_id: UserID,
}

/// Request body for sharing a budget.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareForm {
    pub budget_id: BudgetId,
    pub to_user_id: i64,
}
