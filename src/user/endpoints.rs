//! Endpoints for registering and managing users.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::{AuthenticatedUser, PasswordHash},
    user::{Role, User, UserID, Username, create_user, delete_user, get_all_users, update_user},
};

/// The state needed by the user endpoints.
#[derive(Debug, Clone)]
pub struct UserEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data for registering a new user.
#[derive(Clone, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

/// The fields of a user that may be changed. Missing fields are left as is.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdateForm {
    pub username: Option<String>,
    pub role: Option<Role>,
}

/// Register a new user with the "user" role.
///
/// Responds with 201 and the new user, minus the password hash.
pub async fn register_user(
    State(state): State<UserEndpointState>,
    Json(form): Json<RegisterForm>,
) -> Result<impl IntoResponse, Error> {
    let username = Username::new(&form.username)?;
    let raw_password = form.password;
    let password_hash = tokio::task::spawn_blocking(move || {
        PasswordHash::from_raw_password(&raw_password, PasswordHash::DEFAULT_COST)
    })
    .await
    .map_err(|error| {
        tracing::error!("password hashing task failed: {error}");
        Error::HashingError(error.to_string())
    })??;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let user = create_user(username, password_hash, Role::User, &connection)?;
    tracing::info!("Registered user {} ({})", user.username, user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

/// List all users. Only admins may do this.
pub async fn get_users_endpoint(
    State(state): State<UserEndpointState>,
    Extension(acting_user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<User>>, Error> {
    if !acting_user.is_admin() {
        return Err(Error::Forbidden);
    }

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_all_users(&connection).map(Json)
}

/// Rename a user or change their role.
///
/// Users may rename themselves, but only admins may edit other users or
/// change anyone's role.
pub async fn update_user_endpoint(
    State(state): State<UserEndpointState>,
    Extension(acting_user): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
    Json(form): Json<UserUpdateForm>,
) -> Result<Json<User>, Error> {
    let user_id = UserID::new(user_id);

    if !acting_user.is_admin() && (user_id != acting_user.id || form.role.is_some()) {
        return Err(Error::Forbidden);
    }

    let username = form
        .username
        .as_deref()
        .map(Username::new)
        .transpose()?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    update_user(user_id, username, form.role, &connection).map(Json)
}

/// Delete a user and everything they own. Only admins may do this.
pub async fn delete_user_endpoint(
    State(state): State<UserEndpointState>,
    Extension(acting_user): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, Error> {
    if !acting_user.is_admin() {
        return Err(Error::Forbidden);
    }

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_user(UserID::new(user_id), &connection)?;
    tracing::info!("User {} deleted user {user_id}", acting_user.id);

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod user_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Json,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };

    use crate::{
        Error,
        auth::AuthenticatedUser,
        test_utils::{create_test_user, get_test_connection},
        user::{Role, User, get_user_by_id},
    };

    use super::{
        RegisterForm, UserEndpointState, UserUpdateForm, delete_user_endpoint,
        get_users_endpoint, register_user, update_user_endpoint,
    };

    fn get_state() -> (UserEndpointState, User, User) {
        let connection = get_test_connection();
        let admin = create_test_user("alice", Role::Admin, &connection);
        let user = create_test_user("bob", Role::User, &connection);

        (
            UserEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            admin,
            user,
        )
    }

    fn acting(user: &User) -> Extension<AuthenticatedUser> {
        Extension(AuthenticatedUser {
            id: user.id,
            role: user.role,
        })
    }

    #[tokio::test]
    async fn register_creates_regular_user() {
        let (state, _, _) = get_state();

        let response = register_user(
            State(state),
            Json(RegisterForm {
                username: "carol".to_owned(),
                password: "pw123".to_owned(),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["username"], "carol");
        assert_eq!(json["role"], "user");
        assert!(json.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn register_fails_on_duplicate_username() {
        let (state, _, _) = get_state();

        let result = register_user(
            State(state),
            Json(RegisterForm {
                username: "bob".to_owned(),
                password: "pw123".to_owned(),
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::DuplicateUsername)));
    }

    #[tokio::test]
    async fn register_fails_on_empty_password() {
        let (state, _, _) = get_state();

        let result = register_user(
            State(state),
            Json(RegisterForm {
                username: "carol".to_owned(),
                password: "".to_owned(),
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::EmptyPassword)));
    }

    #[tokio::test]
    async fn admin_can_list_users() {
        let (state, admin, _) = get_state();

        let Json(users) = get_users_endpoint(State(state), acting(&admin)).await.unwrap();

        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn regular_user_cannot_list_users() {
        let (state, _, user) = get_state();

        let result = get_users_endpoint(State(state), acting(&user)).await;

        assert!(matches!(result, Err(Error::Forbidden)));
    }

    #[tokio::test]
    async fn user_can_rename_self() {
        let (state, _, user) = get_state();

        let Json(updated) = update_user_endpoint(
            State(state),
            acting(&user),
            Path(user.id.as_i64()),
            Json(UserUpdateForm {
                username: Some("robert".to_owned()),
                role: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.username.as_ref(), "robert");
        assert_eq!(updated.role, Role::User);
    }

    #[tokio::test]
    async fn user_cannot_promote_self() {
        let (state, _, user) = get_state();

        let result = update_user_endpoint(
            State(state),
            acting(&user),
            Path(user.id.as_i64()),
            Json(UserUpdateForm {
                username: None,
                role: Some(Role::Admin),
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::Forbidden)));
    }

    #[tokio::test]
    async fn user_cannot_edit_other_user() {
        let (state, admin, user) = get_state();

        let result = update_user_endpoint(
            State(state),
            acting(&user),
            Path(admin.id.as_i64()),
            Json(UserUpdateForm {
                username: Some("mallory".to_owned()),
                role: None,
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::Forbidden)));
    }

    #[tokio::test]
    async fn admin_can_change_role() {
        let (state, admin, user) = get_state();

        let Json(updated) = update_user_endpoint(
            State(state),
            acting(&admin),
            Path(user.id.as_i64()),
            Json(UserUpdateForm {
                username: None,
                role: Some(Role::Admin),
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.role, Role::Admin);
    }

    #[tokio::test]
    async fn admin_can_delete_user() {
        let (state, admin, user) = get_state();

        let status =
            delete_user_endpoint(State(state.clone()), acting(&admin), Path(user.id.as_i64()))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(
            get_user_by_id(user.id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn regular_user_cannot_delete_user() {
        let (state, admin, user) = get_state();

        let result =
            delete_user_endpoint(State(state), acting(&user), Path(admin.id.as_i64())).await;

        assert_eq!(result, Err(Error::Forbidden));
    }
}
