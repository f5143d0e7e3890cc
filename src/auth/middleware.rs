//! Authentication middleware that checks the bearer token and resolves the caller's user ID.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    http::{HeaderValue, header::VARY},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{TokenKeys, UserID, get_user_by_id},
};

/// The state needed for the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys for checking bearer tokens.
    pub token_keys: TokenKeys,
    /// The database connection for checking that the token's user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token in the `Authorization` header.
///
/// The user ID is placed into the request and the request is executed normally if the token is
/// valid and belongs to a registered user, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let user_id = match authenticate(&state, &parts.headers) {
        Ok(user_id) => user_id,
        Err(error) => {
            let mut response = error.into_response();
            response
                .headers_mut()
                .insert(VARY, HeaderValue::from_static("Authorization"));
            return response;
        }
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(VARY, HeaderValue::from_static("Authorization"));

    response
}

fn authenticate(state: &AuthState, headers: &axum::http::HeaderMap) -> Result<UserID, Error> {
    let Authorization(bearer) = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or(Error::Unauthorized)?;

    let user_id = state.token_keys.verify(bearer.token())?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match get_user_by_id(user_id, &connection) {
        Ok(user) => Ok(user.id),
        Err(Error::NotFound) => {
            tracing::warn!("Rejected token for user {user_id}, who no longer exists.");
            Err(Error::Unauthorized)
        }
        Err(error) => Err(error),
    }
}
