//! Spend-vs-budget figures computed from a user's transactions.
//!
//! Everything here is a pure function of already fetched records, so the
//! figures are recomputed on every request and never cached.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, Duration};
use time_tz::Tz;

use crate::{
    Error,
    budget::{Budget, Frequency},
    category::{Category, CategoryId},
    timezone::local_date,
    transaction::Transaction,
};

/// The label for transactions without a category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// How much of a budget has been used in the current period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub budget: Budget,
    /// The first day of the current period.
    pub period_start: Date,
    #[serde(with = "rust_decimal::serde::float")]
    pub spent: Decimal,
    /// Negative when the budget has been exceeded.
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining: Decimal,
    pub over_budget: bool,
}

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpending {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Find the first day of the period containing `today`.
///
/// Weekly periods start on Monday, monthly periods on the first of the month
/// and yearly periods on the first of January.
///
/// # Errors
/// Returns an [Error::InvalidDate] if the start would fall outside the
/// supported date range.
pub fn period_start(frequency: Frequency, today: Date) -> Result<Date, Error> {
    let start = match frequency {
        Frequency::Weekly => {
            let days_since_monday = today.weekday().number_days_from_monday();
            today.checked_sub(Duration::days(days_since_monday.into()))
        }
        Frequency::Monthly => today.replace_day(1).ok(),
        Frequency::Yearly => Date::from_ordinal_date(today.year(), 1).ok(),
    };

    start.ok_or_else(|| Error::InvalidDate(format!("no {frequency} period contains {today}")))
}

/// Sum the amounts of the transactions dated on or after `start`.
///
/// # Arguments
/// * `transactions` - The transactions of a single user
/// * `start` - The first day of the period, in local time
/// * `timezone` - The timezone used to convert transaction dates to local dates.
///   Each date uses the offset in effect when the transaction happened.
pub fn period_spend(transactions: &[Transaction], start: Date, timezone: &Tz) -> Decimal {
    transactions
        .iter()
        .filter(|transaction| local_date(transaction.date, timezone) >= start)
        .map(|transaction| transaction.amount.as_decimal())
        .sum()
}

/// Compare a budget against the user's spending in the period containing `today`.
pub fn budget_status(
    budget: &Budget,
    transactions: &[Transaction],
    today: Date,
    timezone: &Tz,
) -> Result<BudgetStatus, Error> {
    let period_start = period_start(budget.frequency, today)?;
    let spent = period_spend(transactions, period_start, timezone);
    let remaining = budget.amount.as_decimal() - spent;

    Ok(BudgetStatus {
        budget: budget.clone(),
        period_start,
        spent,
        remaining,
        over_budget: remaining.is_sign_negative() && !remaining.is_zero(),
    })
}

/// Total the user's spending per category.
///
/// Transactions without a category, or whose category is not in `categories`,
/// are grouped under [UNCATEGORIZED_LABEL].
///
/// # Returns
/// Totals sorted by category name with the uncategorized total, if any, last.
pub fn spending_by_category(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<CategorySpending> {
    let names: HashMap<CategoryId, &str> = categories
        .iter()
        .map(|category| (category.id, category.name.as_ref()))
        .collect();

    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut uncategorized: Option<Decimal> = None;

    for transaction in transactions {
        let amount = transaction.amount.as_decimal();

        match transaction.category_id.and_then(|id| names.get(&id)) {
            Some(name) => *totals.entry(*name).or_insert(Decimal::ZERO) += amount,
            None => *uncategorized.get_or_insert(Decimal::ZERO) += amount,
        }
    }

    let mut spending: Vec<CategorySpending> = totals
        .into_iter()
        .map(|(name, total)| CategorySpending {
            category: name.to_owned(),
            total,
        })
        .collect();

    if let Some(total) = uncategorized {
        spending.push(CategorySpending {
            category: UNCATEGORIZED_LABEL.to_owned(),
            total,
        });
    }

    spending
}
