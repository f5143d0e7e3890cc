//! The API endpoint URIs.
//!
//! For endpoints that take an ID, e.g., '/expenses/{expense_id}', use [format_endpoint].

/// Liveness check for load balancers and the like.
pub const HEALTH: &str = "/health";
/// The route for registering a new user.
pub const REGISTER: &str = "/register";
/// The route for exchanging credentials for a bearer token.
pub const LOG_IN: &str = "/login";

/// The route for creating and listing expenses.
pub const EXPENSES: &str = "/expenses";
/// The route to access a single expense.
pub const EXPENSE: &str = "/expenses/{expense_id}";
/// The route for the sum of the caller's expenses.
pub const TOTAL_EXPENSES: &str = "/total-expenses";

/// The route for creating and listing incomes.
pub const INCOMES: &str = "/incomes";
/// The route to access a single income.
pub const INCOME: &str = "/incomes/{income_id}";
/// The route for the sum of the caller's incomes.
pub const TOTAL_INCOMES: &str = "/total-incomes";

/// The route for the combined, filtered feed of expenses and incomes.
pub const TRANSACTIONS: &str = "/transactions";

/// The route for listing the caller's categories.
pub const CATEGORIES: &str = "/categories";
/// The route to delete a single category.
pub const CATEGORY: &str = "/categories/{category_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is the first brace-delimited segment, e.g. '{expense_id}' in
/// '/expenses/{expense_id}'. If `endpoint_path` has no parameter it is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| start + offset + 1);

    format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end..])
}
