//! Money the user earned.

mod core;
mod endpoints;

pub use core::{
    Income, IncomeId, IncomeInput, create_income, create_income_table, delete_income, get_income,
    get_incomes_for_user, sum_incomes_for_user, update_income,
};
pub use endpoints::{
    create_income_endpoint, delete_income_endpoint, get_income_endpoint, list_incomes_endpoint,
    total_incomes_endpoint, update_income_endpoint,
};
