//! Fixtures shared by the unit and HTTP tests.

use axum_test::TestServer;
use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    AppState, PaginationConfig, build_router,
    auth::{DEFAULT_TOKEN_DURATION, PasswordHash, TokenKeys, User, create_user},
    db::initialize,
};

/// The secret the test app signs tokens with.
pub(crate) const TEST_SECRET: &str = "test-secret";

/// The smallest bcrypt cost, keeps password hashing in tests fast.
pub(crate) const TEST_PASSWORD_COST: u32 = 4;

/// An in-memory database with all the application tables.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// Insert a user named `username` with the password "hunter2".
#[track_caller]
pub(crate) fn create_test_user(username: &str, connection: &Connection) -> User {
    let email: EmailAddress = format!("{username}@example.com")
        .parse()
        .expect("Could not parse test email");

    create_user(
        username,
        &email,
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("Could not create test user")
}

/// App state backed by an in-memory database.
pub(crate) fn get_test_app_state() -> AppState {
    let mut state = AppState::new(
        Connection::open_in_memory().expect("Could not open in-memory SQLite database"),
        TokenKeys::new(TEST_SECRET, DEFAULT_TOKEN_DURATION),
        PaginationConfig::default(),
    )
    .expect("Could not create app state");
    state.password_cost = TEST_PASSWORD_COST;

    state
}

/// A test server for the full router plus the state behind it.
pub(crate) fn get_test_server() -> (TestServer, AppState) {
    let state = get_test_app_state();
    let server =
        TestServer::new(build_router(state.clone()));

    (server, state)
}

/// Create a user directly in the database and return a bearer token for them.
#[track_caller]
pub(crate) fn create_user_with_token(username: &str, state: &AppState) -> (User, String) {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock");
        create_test_user(username, &connection)
    };
    let token = state
        .token_keys
        .mint(user.id)
        .expect("Could not mint test token");

    (user, token)
}
