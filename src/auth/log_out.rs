//! Log-out route handler that invalidates the session cookie and redirects users.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{get_token_from_cookies, invalidate_auth_cookie, user::get_user_by_id},
    endpoints,
};

/// The state needed to log out.
#[derive(Debug, Clone)]
pub struct LogOutState {
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogOutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogOutState> for Key {
    fn from_ref(state: &LogOutState) -> Self {
        state.cookie_key.clone()
    }
}

/// Invalidate the session cookie and redirect the client to the log-in page.
///
/// Anonymous users are refused with an alert since they would have no way to
/// get back to their data.
pub async fn get_log_out(State(state): State<LogOutState>, jar: PrivateCookieJar) -> Response {
    if let Ok(token) = get_token_from_cookies(&jar) {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        match get_user_by_id(token.user_id, &connection) {
            Ok(user) if user.is_anonymous() => {
                tracing::warn!("Refusing to log out anonymous user {}", user.id);
                return Error::AnonymousLogOut.into_alert_response();
            }
            Ok(user) => tracing::info!("User {} logged out", user.id),
            Err(Error::NotFound) => {}
            Err(error) => {
                tracing::error!("Could not get user {}: {error}", token.user_id);
                return error.into_alert_response();
            }
        }
    }

    let jar = invalidate_auth_cookie(jar);

    (
        jar,
        HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
