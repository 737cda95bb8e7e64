//! Session middleware that identifies the browser's user, creating an anonymous user on first
//! visit, and extends the session on every request.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        UserID,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies, set_auth_cookie},
        user::{create_anonymous_user, get_user_by_id},
    },
    internal_server_error::{InternalServerError, get_internal_server_error_redirect},
};

/// The state needed for the session middleware
#[derive(Clone)]
pub struct SessionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up and creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SessionState> for Key {
    fn from_ref(state: &SessionState) -> Self {
        state.cookie_key.clone()
    }
}

/// The user a request is made on behalf of.
#[derive(Debug, PartialEq)]
enum SessionUser {
    /// The session cookie named a user that exists.
    Existing(UserID),
    /// There was no usable session, so an anonymous user was created.
    Created(UserID),
}

impl SessionUser {
    fn id(&self) -> UserID {
        match self {
            SessionUser::Existing(id) | SessionUser::Created(id) => *id,
        }
    }
}

/// Find the user for the session `token_user_id`, or create an anonymous user if there is none.
fn resolve_session_user(
    token_user_id: Option<UserID>,
    connection: &Connection,
) -> Result<SessionUser, Error> {
    if let Some(user_id) = token_user_id {
        match get_user_by_id(user_id, connection) {
            Ok(user) => return Ok(SessionUser::Existing(user.id)),
            Err(Error::NotFound) => {
                tracing::warn!("Session cookie refers to missing user {user_id}.");
            }
            Err(error) => return Err(error),
        }
    }

    let user = create_anonymous_user(connection)?;
    tracing::info!("Created anonymous user {}", user.id);

    Ok(SessionUser::Created(user.id))
}

/// Middleware function that establishes the session user.
///
/// The user ID is placed into the request extensions and the request executed normally.
/// `on_failure` builds the response when no user could be established.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
#[inline]
async fn session_guard_internal(
    state: SessionState,
    request: Request,
    next: Next,
    on_failure: impl Fn() -> Response,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}.");
            return on_failure();
        }
    };
    let token_user_id = get_token_from_cookies(&jar).ok().map(|token| token.user_id);

    let session_user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return on_failure();
            }
        };

        match resolve_session_user(token_user_id, &connection) {
            Ok(session_user) => session_user,
            Err(error) => {
                tracing::error!("Could not establish a session user: {error}");
                return on_failure();
            }
        }
    };

    parts.extensions.insert(session_user.id());
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match session_user {
        SessionUser::Created(user_id) => set_auth_cookie(jar, user_id, state.cookie_duration),
        SessionUser::Existing(_) => {
            extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration)
        }
    };
    let jar = match jar {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error setting session cookie: {err:?}.");
            return Response::from_parts(parts, body);
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Middleware for page routes.
///
/// Renders the internal server error page if no user could be established.
pub async fn session_guard(
    State(state): State<SessionState>,
    request: Request,
    next: Next,
) -> Response {
    session_guard_internal(state, request, next, || {
        InternalServerError::default().into_response()
    })
    .await
}

/// Middleware for routes called by HTMX.
///
/// Sends a HTMX redirect to the internal server error page if no user could be established.
pub async fn session_guard_hx(
    State(state): State<SessionState>,
    request: Request,
    next: Next,
) -> Response {
    session_guard_internal(state, request, next, get_internal_server_error_redirect).await
}
