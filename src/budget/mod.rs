//! Periodic spending ceilings and read-only sharing between users.

mod db;
mod domain;
mod endpoints;
mod share;

pub use db::{
    create_budget, create_budget_table, delete_budget, get_budget, get_budgets_for_user,
    get_readable_budget, update_budget,
};
pub use domain::{
    Budget, BudgetForm, BudgetId, Frequency, NewBudget, ShareForm, ShareId, SharedBudget,
};
pub use endpoints::{
    BudgetEndpointState, create_budget_endpoint, delete_budget_endpoint, get_budget_endpoint,
    get_budget_shares_endpoint, get_budgets_endpoint, get_shared_budgets_endpoint,
    share_budget_endpoint, unshare_budget_endpoint, update_budget_endpoint,
};
pub use share::{
    create_shared_budget_table, get_budgets_shared_with, get_shares_for_budget, share_budget,
    unshare_budget,
};
