//! Route handlers for the caller's expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::UserID,
    expense::{
        ExpenseId, ExpenseInput, create_expense, delete_expense, get_expense,
        get_expenses_for_user, sum_expenses_for_user, update_expense,
    },
    pagination::{PaginationConfig, PaginationQuery},
};

/// The state needed for the expense endpoints.
#[derive(Debug, Clone)]
pub struct ExpenseEndpointState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Controls the default and maximum page size for listing expenses.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ExpenseEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A route handler for recording a new expense, responds with 201 and the stored expense.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseEndpointState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<ExpenseInput>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(input) = payload?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = create_expense(user_id, input, &connection)?;
    tracing::debug!("User {user_id} created expense {}", expense.id);

    Ok((StatusCode::CREATED, Json(json!({ "expense": expense }))))
}

/// A route handler for fetching one of the caller's expenses.
pub async fn get_expense_endpoint(
    State(state): State<ExpenseEndpointState>,
    Extension(user_id): Extension<UserID>,
    expense_id: Result<Path<ExpenseId>, PathRejection>,
) -> Result<impl IntoResponse, Error> {
    let Path(expense_id) = expense_id?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = get_expense(user_id, expense_id, &connection)?;

    Ok(Json(json!({ "expense": expense })))
}

/// A route handler for listing a page of the caller's expenses, most recent first.
pub async fn list_expenses_endpoint(
    State(state): State<ExpenseEndpointState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<impl IntoResponse, Error> {
    let Query(query) = query?;
    let pagination = state.pagination_config.paginate(&query)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = get_expenses_for_user(user_id, pagination, &connection)?;

    Ok(Json(json!({ "expenses": expenses })))
}

/// A route handler for updating one of the caller's expenses.
pub async fn update_expense_endpoint(
    State(state): State<ExpenseEndpointState>,
    Extension(user_id): Extension<UserID>,
    expense_id: Result<Path<ExpenseId>, PathRejection>,
    payload: Result<Json<ExpenseInput>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Path(expense_id) = expense_id?;
    let Json(input) = payload?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = update_expense(user_id, expense_id, input, &connection)?;

    Ok(Json(json!({ "expense": expense })))
}

/// A route handler for deleting one of the caller's expenses.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseEndpointState>,
    Extension(user_id): Extension<UserID>,
    expense_id: Result<Path<ExpenseId>, PathRejection>,
) -> Result<impl IntoResponse, Error> {
    let Path(expense_id) = expense_id?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_expense(user_id, expense_id, &connection)?;

    Ok(Json(json!({ "status": "expense deleted" })))
}

/// A route handler for the sum of all the caller's expenses.
pub async fn total_expenses_endpoint(
    State(state): State<ExpenseEndpointState>,
    Extension(user_id): Extension<UserID>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let total = sum_expenses_for_user(user_id, &connection)?;

    Ok(Json(json!({ "totalExpenses": total })))
}
