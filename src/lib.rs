//! MoneyFlow is a web app for tracking day-to-day spending against monthly budgets.
//!
//! This library provides a REST API that directly serves HTML pages. Every
//! browser is given an anonymous identity on its first visit, which can later
//! be upgraded to an email and password account without losing any data.
//! Receipts can be photographed and turned into transactions with the Gemini
//! vision API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod category;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod receipt;
mod routing;
mod settings;
mod sync;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::{
    AppState, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_SCAN_TIMEOUT, ScannerConfig,
};
pub use auth::{PasswordHash, User, UserID, ValidatedPassword, create_credentialed_user};
pub use category::{
    Category, CategoryColor, CategoryIcon, CategoryName, DEFAULT_CATEGORIES, get_categories,
};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use receipt::ScanError;
pub use routing::build_router;
pub use sync::ensure_default_categories;
pub use transaction::{Transaction, TransactionKind, create_transaction};

use crate::{
    alert::Alert, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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
    /// The email address is already attached to another user.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// An account upgrade was attempted for a user that already has credentials.
    #[error("the account already has an email and password")]
    AlreadyRegistered,

    /// A log-out was attempted for an anonymous user.
    ///
    /// Anonymous users cannot log back in, so logging out would orphan their data.
    #[error("anonymous users cannot log out")]
    AnonymousLogOut,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty string was used to create a category name.
    #[error("カテゴリ名を入力してください")]
    EmptyCategoryName,

    /// The category icon was not exactly one character.
    #[error("アイコンは絵文字1文字で入力してください (got \"{0}\")")]
    InvalidCategoryIcon(String),

    /// The colour is not one of the palette colours.
    #[error("\"{0}\" is not a valid category colour")]
    InvalidColor(String),

    /// The category is not one of the user's categories.
    #[error("カテゴリを選択してください")]
    UnknownCategory,

    /// A money amount could not be parsed as a non-negative whole number of yen.
    #[error("金額を正しく入力してください (got \"{0}\")")]
    InvalidAmount(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The session cookie could not be created or read.
    #[error("cookie error: {0}")]
    CookieError(String),

    /// The multipart form could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// The receipt scanner failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
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

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "タイムゾーンの設定が正しくありません",
                fix: &timezone_fix(&timezone),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as an alert fragment for htmx requests.
    fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "タイムゾーンの設定が正しくありません".to_owned(),
                    details: timezone_fix(&timezone),
                },
            ),
            Error::AnonymousLogOut => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "ログアウトできません".to_owned(),
                    details: "ゲストのままログアウトするとデータにアクセスできなくなります。\
                        先にメールアドレスとパスワードを登録してください。"
                        .to_owned(),
                },
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "履歴を削除できませんでした".to_owned(),
                    details: "この履歴は見つかりませんでした。既に削除されている可能性があります。"
                        .to_owned(),
                },
            ),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "カテゴリを更新できませんでした".to_owned(),
                    details: "このカテゴリは見つかりませんでした。".to_owned(),
                },
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "カテゴリを削除できませんでした".to_owned(),
                    details: "このカテゴリは見つかりませんでした。既に削除されている可能性があります。"
                        .to_owned(),
                },
            ),
            Error::InvalidColor(color) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "色を正しく選択してください".to_owned(),
                    details: format!("\"{color}\" はパレットにない色です。"),
                },
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "金額を正しく入力してください".to_owned(),
                    details: format!("\"{amount}\" は0以上の整数ではありません。"),
                },
            ),
            Error::UnknownCategory => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "カテゴリを選択してください".to_owned(),
                    details: "選択されたカテゴリは見つかりませんでした。".to_owned(),
                },
            ),
            Error::MultipartError(error) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "アップロードを読み込めませんでした".to_owned(),
                    details: error,
                },
            ),
            Error::Scan(error) => return error.into_alert_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "問題が発生しました".to_owned(),
                    details: "予期しないエラーが発生しました。詳しくはサーバーのログを確認してください。"
                        .to_owned(),
                },
            ),
        };

        alert.into_response_with_status(status_code)
    }
}

fn timezone_fix(timezone: &str) -> String {
    format!(
        "タイムゾーン \"{timezone}\" を読み込めませんでした。\
        サーバーの設定で正しいタイムゾーン名 (例: Asia/Tokyo) を指定してください。"
    )
}
