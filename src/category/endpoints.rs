//! Endpoints for listing and deleting a user's categories.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{CategoryId, delete_category, get_categories_for_user},
};

/// The state needed for the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryEndpointState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists the caller's categories.
pub async fn list_categories_endpoint(
    State(state): State<CategoryEndpointState>,
    Extension(user_id): Extension<UserID>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories_for_user(user_id, &connection)?;

    Ok(Json(json!({ "categories": categories })))
}

/// A route handler that deletes one of the caller's categories.
///
/// Fails with 409 while an expense or income still uses the category.
pub async fn delete_category_endpoint(
    State(state): State<CategoryEndpointState>,
    Extension(user_id): Extension<UserID>,
    category_id: Result<Path<CategoryId>, PathRejection>,
) -> Result<impl IntoResponse, Error> {
    let Path(category_id) = category_id?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_category(user_id, category_id, &connection)?;

    Ok(Json(json!({ "status": "category deleted" })))
}
