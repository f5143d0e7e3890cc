mod log_in;
mod middleware;
mod password;
mod register_user;
mod token;
mod user;

pub use log_in::log_in;
pub use middleware::{AuthState, auth_guard};
pub use password::PasswordHash;
pub use register_user::register_user;
pub use token::{DEFAULT_TOKEN_DURATION, TokenKeys};
pub use user::{User, UserID, create_user_table, get_user_by_id, get_user_by_username};
pub(crate) use user::create_user;
