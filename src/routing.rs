//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};

use crate::{
    AppState, Error,
    auth::{auth_guard, log_in, register_user},
    category::{delete_category_endpoint, list_categories_endpoint},
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint,
        list_expenses_endpoint, total_expenses_endpoint, update_expense_endpoint,
    },
    income::{
        create_income_endpoint, delete_income_endpoint, get_income_endpoint,
        list_incomes_endpoint, total_incomes_endpoint, update_income_endpoint,
    },
    transaction::query_transactions_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(log_in));

    let protected_routes = Router::new()
        .route(
            endpoints::EXPENSES,
            post(create_expense_endpoint).get(list_expenses_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .put(update_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .route(endpoints::TOTAL_EXPENSES, get(total_expenses_endpoint))
        .route(
            endpoints::INCOMES,
            post(create_income_endpoint).get(list_incomes_endpoint),
        )
        .route(
            endpoints::INCOME,
            get(get_income_endpoint)
                .put(update_income_endpoint)
                .delete(delete_income_endpoint),
        )
        .route(endpoints::TOTAL_INCOMES, get(total_incomes_endpoint))
        .route(endpoints::TRANSACTIONS, get(query_transactions_endpoint))
        .route(endpoints::CATEGORIES, get(list_categories_endpoint))
        .route(endpoints::CATEGORY, delete(delete_category_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Report that the server is up.
async fn get_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn get_404_not_found() -> impl IntoResponse {
    Error::NotFound
}
