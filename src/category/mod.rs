//! Per-user categories for grouping expenses and incomes.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_category_table, delete_category, get_categories_for_user, get_category_id_by_name,
    resolve_category,
};
pub use domain::{Category, CategoryId, CategoryName};
pub use endpoints::{delete_category_endpoint, list_categories_endpoint};
