//! Spend-vs-budget aggregation.

mod aggregation;
mod endpoints;

pub use aggregation::{
    BudgetStatus, CategorySpending, UNCATEGORIZED_LABEL, budget_status, period_spend,
    period_start, spending_by_category,
};
pub use endpoints::{Summary, SummaryEndpointState, get_summary_endpoint};
