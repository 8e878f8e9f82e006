//! Endpoints for recording, listing, editing and deleting transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use time_tz::Tz;

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    timezone::get_timezone,
    transaction::{
        Transaction, TransactionForm, TransactionId, create_transaction, delete_transaction,
        get_transactions_for_user, update_transaction,
    },
};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionEndpointState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl TransactionEndpointState {
    fn timezone(&self) -> Result<&'static Tz, Error> {
        get_timezone(&self.local_timezone)
    }
}

/// Record a transaction for the logged in user.
///
/// Responds with 201 and the stored transaction, including its ID and date.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(form): Json<TransactionForm>,
) -> Result<impl IntoResponse, Error> {
    let builder = form.into_builder(state.timezone()?)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let transaction = create_transaction(user.id, builder, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// List the logged in user's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_transactions_for_user(user.id, &connection).map(Json)
}

/// Replace the details of one of the logged in user's transactions.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<TransactionId>,
    Json(form): Json<TransactionForm>,
) -> Result<Json<Transaction>, Error> {
    let builder = form.into_builder(state.timezone()?)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    update_transaction(transaction_id, user.id, builder, &connection).map(Json)
}

/// Delete one of the logged in user's transactions.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_transaction(transaction_id, user.id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
