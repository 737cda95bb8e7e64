//! Anonymous sessions, account upgrades, and signing in and out.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod token;
mod upgrade;
pub(crate) mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub(crate) use cookie::{COOKIE_TOKEN, get_token_from_cookies};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{session_guard, session_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub(crate) use token::Token;
pub use upgrade::{upgrade_account_endpoint, upgrade_form};
pub use user::{User, UserID, create_credentialed_user, create_user_table, get_user_by_id};
