//! Money is a JSON API for tracking personal expenses and incomes.
//!
//! Every record belongs to exactly one user. Expenses and incomes are grouped
//! into per-user categories that are created the first time they are named,
//! and both kinds of record can be read back together as a single,
//! chronologically ordered feed of transactions.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod income;
mod logging;
mod pagination;
mod routing;
mod timestamp;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, TokenKeys, User, UserID};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use pagination::PaginationConfig;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for the ctrl+c signal: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not install the terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request body could not be decoded.
    #[error("invalid request payload: {0}")]
    InvalidPayload(String),

    /// The request body was larger than the server accepts.
    #[error("request body is too large")]
    PayloadTooLarge,

    /// A path parameter that should be a database ID could not be parsed.
    #[error("invalid id parameter")]
    InvalidId,

    /// An update was submitted without an amount.
    #[error("amount is required")]
    MissingAmount,

    /// A query string parameter was malformed or out of range.
    #[error("invalid query parameter: {0}")]
    InvalidQuery(String),

    /// A transaction type other than "expense" or "income" was requested.
    #[error("invalid transaction type \"{0}\", expected \"expense\" or \"income\"")]
    InvalidTransactionType(String),

    /// A user tried to register with an empty username.
    #[error("username is required")]
    EmptyUsername,

    /// A user tried to register with a malformed email address.
    #[error("invalid email")]
    InvalidEmail,

    /// A user tried to register or log in with an empty password.
    #[error("password is required")]
    EmptyPassword,

    /// The username and password did not match a registered user.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The request did not carry a valid bearer token for an existing user.
    #[error("unauthorized")]
    Unauthorized,

    /// The requested resource was not found.
    ///
    /// Records owned by another user are reported as not found so that their
    /// existence is never revealed.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A transaction query named a category the user has never used.
    #[error("category not found")]
    CategoryNotFound,

    /// The category is still referenced by an expense or income.
    #[error("the category is still used by one or more transactions")]
    CategoryInUse,

    /// The username has already been registered.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// The email address has already been registered.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidPayload(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidQuery(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path parameter: {}", rejection.body_text());
        Error::InvalidId
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidPayload(_)
            | Error::InvalidId
            | Error::MissingAmount
            | Error::InvalidQuery(_)
            | Error::InvalidTransactionType(_)
            | Error::EmptyUsername
            | Error::InvalidEmail
            | Error::EmptyPassword => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::InvalidCredentials | Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotFound | Error::CategoryNotFound => StatusCode::NOT_FOUND,
            Error::CategoryInUse | Error::DuplicateUsername | Error::DuplicateEmail => {
                StatusCode::CONFLICT
            }
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal details stay in the server logs.
            tracing::error!("An unexpected error occurred: {}", self);
            "internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
