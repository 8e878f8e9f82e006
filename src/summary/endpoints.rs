//! The spend-vs-budget summary endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    budget::get_budgets_for_user,
    category::get_categories_for_user,
    summary::{BudgetStatus, CategorySpending, budget_status, spending_by_category},
    timezone::{get_timezone, local_today},
    transaction::get_transactions_for_user,
};

/// The state needed by the summary endpoint.
#[derive(Debug, Clone)]
pub struct SummaryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone that decides when periods start.
    pub local_timezone: String,
}

impl FromRef<AppState> for SummaryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The logged in user's budgets and spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub budgets: Vec<BudgetStatus>,
    pub spending_by_category: Vec<CategorySpending>,
}

/// Summarize the logged in user's spending against each of their budgets.
pub async fn get_summary_endpoint(
    State(state): State<SummaryEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Summary>, Error> {
    let timezone = get_timezone(&state.local_timezone)?;
    let today = local_today(&state.local_timezone)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let transactions = get_transactions_for_user(user.id, &connection)?;
    let categories = get_categories_for_user(user.id, &connection)?;
    let budgets = get_budgets_for_user(user.id, &connection)?;

    let budgets = budgets
        .iter()
        .map(|budget| budget_status(budget, &transactions, today, timezone))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(Summary {
        budgets,
        spending_by_category: spending_by_category(&transactions, &categories),
    }))
}
