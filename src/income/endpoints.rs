//! Route handlers for the caller's incomes.

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
    income::{
        IncomeId, IncomeInput, create_income, delete_income, get_income,
        get_incomes_for_user, sum_incomes_for_user, update_income,
    },
    pagination::{PaginationConfig, PaginationQuery},
};

/// The state needed for the income endpoints.
#[derive(Debug, Clone)]
pub struct IncomeEndpointState {
    /// The database connection for managing incomes.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Controls the default and maximum page size for listing incomes.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for IncomeEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A route handler for recording a new income, responds with 201 and the stored income.
pub async fn create_income_endpoint(
    State(state): State<IncomeEndpointState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<IncomeInput>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(input) = payload?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let income = create_income(user_id, input, &connection)?;
    tracing::debug!("User {user_id} created income {}", income.id);

    Ok((StatusCode::CREATED, Json(json!({ "income": income }))))
}

/// A route handler for fetching one of the caller's incomes.
pub async fn get_income_endpoint(
    State(state): State<IncomeEndpointState>,
    Extension(user_id): Extension<UserID>,
    income_id: Result<Path<IncomeId>, PathRejection>,
) -> Result<impl IntoResponse, Error> {
    let Path(income_id) = income_id?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let income = get_income(user_id, income_id, &connection)?;

    Ok(Json(json!({ "income": income })))
}

/// A route handler for listing a page of the caller's incomes, most recent first.
pub async fn list_incomes_endpoint(
    State(state): State<IncomeEndpointState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<impl IntoResponse, Error> {
    let Query(query) = query?;
    let pagination = state.pagination_config.paginate(&query)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let incomes = get_incomes_for_user(user_id, pagination, &connection)?;

    Ok(Json(json!({ "incomes": incomes })))
}

/// A route handler for updating one of the caller's incomes.
pub async fn update_income_endpoint(
    State(state): State<IncomeEndpointState>,
    Extension(user_id): Extension<UserID>,
    income_id: Result<Path<IncomeId>, PathRejection>,
    payload: Result<Json<IncomeInput>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Path(income_id) = income_id?;
    let Json(input) = payload?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let income = update_income(user_id, income_id, input, &connection)?;

    Ok(Json(json!({ "income": income })))
}

/// A route handler for deleting one of the caller's incomes.
pub async fn delete_income_endpoint(
    State(state): State<IncomeEndpointState>,
    Extension(user_id): Extension<UserID>,
    income_id: Result<Path<IncomeId>, PathRejection>,
) -> Result<impl IntoResponse, Error> {
    let Path(income_id) = income_id?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_income(user_id, income_id, &connection)?;

    Ok(Json(json!({ "status": "income deleted" })))
}

/// A route handler for the sum of all the caller's incomes.
pub async fn total_incomes_endpoint(
    State(state): State<IncomeEndpointState>,
    Extension(user_id): Extension<UserID>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let total = sum_incomes_for_user(user_id, &connection)?;

    Ok(Json(json!({ "totalIncomes": total })))
}
