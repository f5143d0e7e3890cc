//! The endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::{PasswordHash, TokenKeys, create_user},
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for storing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for minting the new user's token.
    pub token_keys: TokenKeys,
    /// The bcrypt cost for hashing the new user's password.
    pub password_cost: u32,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            token_keys: state.token_keys.clone(),
            password_cost: state.password_cost,
        }
    }
}

/// The data for registering a user.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The name to log in with.
    #[serde(default)]
    pub username: String,
    /// The user's email address.
    #[serde(default)]
    pub email: String,
    /// The user's password in plain text.
    #[serde(default)]
    pub password: String,
}

/// A route handler for registering a new user.
///
/// Responds with 201 and a bearer token for the new user on success.
pub async fn register_user(
    State(state): State<RegistrationState>,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(form) = payload?;

    let username = form.username.trim();
    if username.is_empty() {
        return Err(Error::EmptyUsername);
    }

    let email: EmailAddress = form.email.trim().parse().map_err(|error| {
        tracing::debug!("Rejected email {:?}: {error}", form.email);
        Error::InvalidEmail
    })?;

    let password_hash = PasswordHash::new(&form.password, state.password_cost)?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        create_user(username, &email, password_hash, &connection)?
    };

    let token = state.token_keys.mint(user.id)?;
    tracing::info!("Registered user {} ({})", user.id, user.username);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "user registered", "token": token })),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{build_router, endpoints, test_utils::get_test_app_state};

    fn get_test_server() -> TestServer {
        TestServer::new(build_router(get_test_app_state()))
    }

    #[tokio::test]
    async fn register_returns_token() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "hunter2",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["message"], "user registered");
        assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));
    }

    #[tokio::test]
    async fn register_fails_on_empty_username() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "  ",
                "email": "alice@example.com",
                "password": "hunter2",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "username is required" }));
    }

    #[tokio::test]
    async fn register_fails_on_invalid_email() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "alice",
                "email": "not an email",
                "password": "hunter2",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "invalid email" }));
    }

    #[tokio::test]
    async fn register_fails_on_empty_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "password is required" }));
    }

    #[tokio::test]
    async fn register_fails_on_taken_username() {
        let server = get_test_server();
        let form = json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "hunter2",
        });
        server
            .post(endpoints::REGISTER)
            .json(&form)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "alice",
                "email": "alice2@example.com",
                "password": "hunter2",
            }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn register_fails_on_malformed_json() {
        let server = get_test_server();

        server
            .post(endpoints::REGISTER)
            .content_type("application/json")
            .text("{\"username\": ")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
