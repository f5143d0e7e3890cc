//! Money the user spent.

mod core;
mod endpoints;

pub use core::{
    Expense, ExpenseId, ExpenseInput, create_expense, create_expense_table, delete_expense,
    get_expense, get_expenses_for_user, sum_expenses_for_user, update_expense,
};
pub use endpoints::{
    create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint,
    list_expenses_endpoint, total_expenses_endpoint, update_expense_endpoint,
};
