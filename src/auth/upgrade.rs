//! Upgrading an anonymous user to an email and password account.
//!
//! The anonymous user keeps its ID, so its categories and transactions carry over.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use email_address::EmailAddress;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::{PasswordHash, UserID, ValidatedPassword, user::upgrade_user},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, email_input, loading_spinner, password_input},
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 8;

/// The form for attaching an email and password to an anonymous user.
pub fn upgrade_form(email: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::UPGRADE_ACCOUNT)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#upgrade-indicator"
            class="space-y-4"
        {
            (email_input(email))

            (password_input("", PASSWORD_INPUT_MIN_LENGTH, error_message))

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="upgrade-indicator"
                {
                    (loading_spinner())
                }
                "アカウントを登録"
            }
        }
    }
}

/// The state needed to upgrade an account.
#[derive(Debug, Clone)]
pub struct UpgradeState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpgradeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered by the user in the upgrade form.
#[derive(Clone, Deserialize)]
pub struct UpgradeForm {
    pub email: String,
    pub password: String,
}

/// Attach an email and password to the current anonymous user.
///
/// On success the client is redirected to the settings page, otherwise the
/// form is returned with an error message.
pub async fn upgrade_account_endpoint(
    State(state): State<UpgradeState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<UpgradeForm>,
) -> Response {
    let email = match EmailAddress::from_str(form.email.trim()) {
        Ok(email) => email,
        Err(error) => {
            return upgrade_form(&form.email, Some(&format!("メールアドレスが正しくありません: {error}")))
                .into_response();
        }
    };

    let password_hash = match ValidatedPassword::new(&form.password, &[&form.email])
        .and_then(|password| PasswordHash::new(password, PasswordHash::DEFAULT_COST))
    {
        Ok(password_hash) => password_hash,
        Err(Error::TooWeak(feedback)) => {
            return upgrade_form(
                &form.email,
                Some(&format!("パスワードが弱すぎます: {feedback}")),
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("Could not hash password for user {user_id}: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match upgrade_user(user_id, email, password_hash, &connection) {
        Ok(user) => {
            tracing::info!("Upgraded anonymous user {} to a credentialed account", user.id);
            (
                HxRedirect(endpoints::SETTINGS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::DuplicateEmail) => upgrade_form(
            &form.email,
            Some("このメールアドレスは既に使われています。"),
        )
        .into_response(),
        Err(Error::AlreadyRegistered) => upgrade_form(
            &form.email,
            Some("このアカウントは既に登録済みです。"),
        )
        .into_response(),
        Err(error) => {
            tracing::error!("Could not upgrade user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}
