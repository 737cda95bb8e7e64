//! The page and endpoint for signing in to an existing account from a new browser.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use email_address::EmailAddress;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        invalidate_auth_cookie, set_auth_cookie,
        user::{User, get_user_by_email},
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, base, email_input, form_card, link, loading_spinner, password_input,
    },
};

fn log_in_form(email: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email))

            (password_input("", 0, error_message))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "ログイン"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "ログインすると、このブラウザのゲストデータは表示されなくなります。 "
                (link(endpoints::DASHBOARD_VIEW, "ゲストのまま使う"))
            }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    let content = form_card("アカウントにログイン", &log_in_form("", None));
    base("ログイン", &[], &content).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "メールアドレスまたはパスワードが違います。";
const INTERNAL_ERROR_MSG: &str = "エラーが発生しました。しばらくしてからもう一度お試しください。";

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the session cookie is switched to the
/// credentialed user and the client is redirected to the dashboard page.
/// Otherwise, the form is returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let Ok(email) = EmailAddress::from_str(user_data.email.trim()) else {
        return log_in_form(&user_data.email, Some(INVALID_CREDENTIALS_ERROR_MSG)).into_response();
    };

    let user: User = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return log_in_form(&user_data.email, Some(INTERNAL_ERROR_MSG)).into_response();
            }
        };

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                return log_in_form(&user_data.email, Some(INVALID_CREDENTIALS_ERROR_MSG))
                    .into_response();
            }
            Err(error) => {
                tracing::error!("Unhandled error while verifying credentials: {error}");
                return log_in_form(&user_data.email, Some(INTERNAL_ERROR_MSG)).into_response();
            }
        }
    };

    let Some(credentials) = &user.credentials else {
        tracing::error!("User {} was found by email but has no credentials", user.id);
        return log_in_form(&user_data.email, Some(INTERNAL_ERROR_MSG)).into_response();
    };

    let is_password_valid = match credentials.password_hash.verify(&user_data.password) {
        Ok(is_password_valid) => is_password_valid,
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(&user_data.email, Some(INTERNAL_ERROR_MSG)).into_response();
        }
    };

    if !is_password_valid {
        return log_in_form(&user_data.email, Some(INVALID_CREDENTIALS_ERROR_MSG)).into_response();
    }

    tracing::info!("User {} logged in", user.id);

    set_auth_cookie(jar.clone(), user.id, state.cookie_duration)
        .map(|updated_jar| {
            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                updated_jar,
            )
        })
        .map_err(|err| {
            tracing::error!("Error setting auth cookie: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
        })
        .into_response()
}

/// The raw data entered by the user in the log-in form.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

#[cfg(test)]
mod log_in_page_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    use super::get_log_in_page;

    #[tokio::test]
    async fn log_in_page_displays_form() {
        let response = get_log_in_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::LOG_IN_API, "hx-post");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_submit_button(&form);
    }
}
