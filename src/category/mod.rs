//! Per-user categories for grouping transactions.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_category, create_category_table, delete_category, get_categories_for_user,
    get_category, rename_category,
};
pub use domain::{Category, CategoryForm, CategoryId, CategoryName};
pub use endpoints::{
    CategoryEndpointState, create_category_endpoint, delete_category_endpoint,
    get_categories_endpoint, update_category_endpoint,
};
