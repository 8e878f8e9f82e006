//! Endpoints for managing budgets and sharing them with other users.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    budget::{
        Budget, BudgetForm, BudgetId, ShareForm, ShareId, SharedBudget, create_budget,
        delete_budget, get_budgets_for_user, get_budgets_shared_with, get_readable_budget,
        get_shares_for_budget, share_budget, unshare_budget, update_budget,
    },
    timezone::local_today,
    user::UserID,
};

/// The state needed by the budget endpoints.
#[derive(Debug, Clone)]
pub struct BudgetEndpointState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone used to pick the default budget period.
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Create a budget for the logged in user.
pub async fn create_budget_endpoint(
    State(state): State<BudgetEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(form): Json<BudgetForm>,
) -> Result<impl IntoResponse, Error> {
    let new_budget = form.into_new_budget(local_today(&state.local_timezone)?);

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let budget = create_budget(user.id, new_budget, &connection)?;

    Ok((StatusCode::CREATED, Json(budget)))
}

/// List the budgets owned by the logged in user.
pub async fn get_budgets_endpoint(
    State(state): State<BudgetEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Budget>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_budgets_for_user(user.id, &connection).map(Json)
}

/// Get a budget owned by or shared with the logged in user.
pub async fn get_budget_endpoint(
    State(state): State<BudgetEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Json<Budget>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_readable_budget(budget_id, user.id, &connection).map(Json)
}

/// Replace the details of one of the logged in user's budgets.
pub async fn update_budget_endpoint(
    State(state): State<BudgetEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(budget_id): Path<BudgetId>,
    Json(form): Json<BudgetForm>,
) -> Result<Json<Budget>, Error> {
    let new_budget = form.into_new_budget(local_today(&state.local_timezone)?);

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    update_budget(budget_id, user.id, new_budget, &connection).map(Json)
}

/// Delete one of the logged in user's budgets and revoke its shares.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(budget_id): Path<BudgetId>,
) -> Result<StatusCode, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_budget(budget_id, user.id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Share one of the logged in user's budgets with another user.
pub async fn share_budget_endpoint(
    State(state): State<BudgetEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(form): Json<ShareForm>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let share = share_budget(
        form.budget_id,
        user.id,
        UserID::new(form.to_user_id),
        &connection,
    )?;

    tracing::info!(
        "user {} shared budget {} with user {}",
        share.from_user_id,
        share.budget_id,
        share.to_user_id
    );

    Ok((StatusCode::CREATED, Json(share)))
}

/// List the budgets other users have shared with the logged in user.
pub async fn get_shared_budgets_endpoint(
    State(state): State<BudgetEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Budget>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_budgets_shared_with(user.id, &connection).map(Json)
}

/// List who one of the logged in user's budgets is shared with.
pub async fn get_budget_shares_endpoint(
    State(state): State<BudgetEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Json<Vec<SharedBudget>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_shares_for_budget(budget_id, user.id, &connection).map(Json)
}

/// Revoke a share granted by the logged in user.
pub async fn unshare_budget_endpoint(
    State(state): State<BudgetEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(share_id): Path<ShareId>,
) -> Result<StatusCode, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    unshare_budget(share_id, user.id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
