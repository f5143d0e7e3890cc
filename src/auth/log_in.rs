//! The endpoint for exchanging a username and password for a bearer token.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::{TokenKeys, get_user_by_username},
};

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The keys for minting the user's token.
    pub token_keys: TokenKeys,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials submitted when logging in.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogInForm {
    /// The name the user registered with.
    #[serde(default)]
    pub username: String,
    /// The user's password in plain text.
    #[serde(default)]
    pub password: String,
}

/// Handler for log-in requests.
///
/// On success, responds with a bearer token for the user.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the username is not registered or the password is
/// wrong. The two cases are indistinguishable to the client.
pub async fn log_in(
    State(state): State<LoginState>,
    payload: Result<Json<LogInForm>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(form) = payload?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_username(form.username.trim(), &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    if !user.password_hash.verify(&form.password)? {
        tracing::debug!("Wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let token = state.token_keys.mint(user.id)?;

    Ok(Json(json!({ "message": "login successful", "token": token })))
}
