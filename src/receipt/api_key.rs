//! The user's own Gemini API key, kept in an encrypted cookie in their browser.

use axum::{
    Form,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use maud::{Markup, html};
use secrecy::SecretString;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};

use crate::{
    alert::Alert,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    receipt::ScanError,
};

pub(crate) const COOKIE_API_KEY: &str = "gemini_api_key";

const API_KEY_COOKIE_DURATION: Duration = Duration::days(365);

/// The form for saving a Gemini API key.
///
/// The saved key is never sent back to the browser, `has_key` only changes the placeholder.
pub fn api_key_form(has_key: bool) -> Markup {
    let placeholder = if has_key {
        "保存済み (変更する場合は入力)"
    } else {
        "AIzaSy..."
    };

    html! {
        form
            hx-post=(endpoints::API_KEY)
            hx-target="#alert-container"
            hx-target-error="#alert-container"
            hx-swap="innerHTML"
            class="space-y-3"
        {
            label for="api_key" class=(FORM_LABEL_STYLE) { "Gemini API キー" }

            input
                type="password"
                name="api_key"
                id="api_key"
                autocomplete="off"
                placeholder=(placeholder)
                class=(FORM_TEXT_INPUT_STYLE);

            p class="text-xs text-gray-500 dark:text-gray-400"
            {
                "キーはこのブラウザにのみ保存されます。空欄で保存すると削除されます。"
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "保存" }
        }
    }
}

/// The raw data entered by the user in the API key form.
#[derive(Clone, Deserialize)]
pub struct ApiKeyForm {
    #[serde(default)]
    pub api_key: String,
}

/// Store the submitted API key in an encrypted cookie, or remove the cookie if the key is blank.
pub async fn save_api_key_endpoint(
    jar: PrivateCookieJar,
    Form(form): Form<ApiKeyForm>,
) -> Response {
    let api_key = form.api_key.trim();

    if api_key.is_empty() {
        let jar = jar.remove(Cookie::build(COOKIE_API_KEY).path("/"));
        let alert = Alert::SuccessSimple {
            message: "APIキーを削除しました".to_owned(),
        };

        return (jar, alert.into_response_with_status(StatusCode::OK)).into_response();
    }

    let jar = jar.add(
        Cookie::build((COOKIE_API_KEY, api_key.to_owned()))
            .path("/")
            .expires(OffsetDateTime::now_utc() + API_KEY_COOKIE_DURATION)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    );
    let alert = Alert::SuccessSimple {
        message: "APIキーを保存しました！".to_owned(),
    };

    (jar, alert.into_response_with_status(StatusCode::OK)).into_response()
}

/// Whether the browser has a saved API key.
pub fn has_saved_api_key(jar: &PrivateCookieJar) -> bool {
    jar.get(COOKIE_API_KEY).is_some()
}

/// Pick the API key for a scan, preferring the user's own key over the server's.
///
/// # Errors
///
/// Returns [ScanError::MissingApiKey] if there is neither.
pub fn resolve_api_key(
    jar: &PrivateCookieJar,
    default_api_key: Option<&SecretString>,
) -> Result<SecretString, ScanError> {
    if let Some(cookie) = jar.get(COOKIE_API_KEY) {
        let key = cookie.value_trimmed();

        if !key.is_empty() {
            return Ok(SecretString::from(key.to_owned()));
        }
    }

    default_api_key.cloned().ok_or(ScanError::MissingApiKey)
}
