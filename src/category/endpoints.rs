//! Endpoints for creating, listing, renaming and deleting categories.

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
    category::{
        Category, CategoryForm, CategoryId, CategoryName, create_category, delete_category,
        get_categories_for_user, rename_category,
    },
};

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a category for the logged in user.
pub async fn create_category_endpoint(
    State(state): State<CategoryEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(form): Json<CategoryForm>,
) -> Result<impl IntoResponse, Error> {
    let name = CategoryName::new(&form.name)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let category = create_category(user.id, name, &connection)?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// List the logged in user's categories.
pub async fn get_categories_endpoint(
    State(state): State<CategoryEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_categories_for_user(user.id, &connection).map(Json)
}

/// Rename one of the logged in user's categories.
pub async fn update_category_endpoint(
    State(state): State<CategoryEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(category_id): Path<CategoryId>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<Category>, Error> {
    let name = CategoryName::new(&form.name)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    rename_category(category_id, user.id, name, &connection).map(Json)
}

/// Delete one of the logged in user's categories.
pub async fn delete_category_endpoint(
    State(state): State<CategoryEndpointState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_category(category_id, user.id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
