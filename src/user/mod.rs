//! Users, their credentials and roles.

mod db;
mod domain;
mod endpoints;

pub use db::{
    bootstrap_admin, check_credentials, count_users, create_user, create_user_table, delete_user,
    find_user_by_username, get_all_users, get_user_by_id, get_user_by_username, update_password,
    update_user, verify_credentials,
};
pub use domain::{Role, User, UserID, Username};
pub use endpoints::{
    RegisterForm, UserEndpointState, UserUpdateForm, delete_user_endpoint, get_users_endpoint,
    register_user, update_user_endpoint,
};
