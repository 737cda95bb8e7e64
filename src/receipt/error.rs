//! Error types for the receipt scanner.

use axum::{http::StatusCode, response::Response};
use serde::Deserialize;
use thiserror::Error;

use crate::alert::Alert;

/// Errors that can occur while scanning a receipt.
#[derive(Debug, Error, PartialEq)]
pub enum ScanError {
    /// Neither the user nor the server has a Gemini API key.
    #[error("no Gemini API key has been set")]
    MissingApiKey,

    /// The upload was missing or was not an image.
    #[error("the upload is not an image (got {0:?})")]
    NotAnImage(String),

    /// Another scan for the same user is still in progress.
    #[error("a receipt is already being scanned")]
    Busy,

    /// There are no scanned items waiting to be saved.
    #[error("there are no scanned items to review")]
    NothingToReview,

    /// The reviewed items sent back by the browser do not line up.
    #[error("invalid review form: {0}")]
    InvalidReview(String),

    /// The request to the API failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API rejected the API key.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The API returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// The status text from the API, e.g. "INVALID_ARGUMENT".
        status: String,
        /// Error message.
        message: String,
    },

    /// The reply did not contain a receipt in the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ScanError {
    fn from(error: reqwest::Error) -> Self {
        ScanError::Http(error.to_string())
    }
}

impl ScanError {
    /// Render the error as an alert fragment for htmx requests.
    pub(crate) fn into_alert_response(self) -> Response {
        let (status_code, message, details) = match self {
            ScanError::MissingApiKey => (
                StatusCode::BAD_REQUEST,
                "APIキーが設定されていません",
                "設定画面でGemini APIキーを設定してください。".to_owned(),
            ),
            ScanError::NotAnImage(_) => (
                StatusCode::BAD_REQUEST,
                "画像を選択してください",
                "レシートの写真 (JPEG、PNGなど) をアップロードしてください。".to_owned(),
            ),
            ScanError::Unauthorized(_) => (
                StatusCode::BAD_REQUEST,
                "APIキーが正しくありません",
                "設定画面でGemini APIキーを確認してください。".to_owned(),
            ),
            ScanError::InvalidReview(_) => (
                StatusCode::BAD_REQUEST,
                "明細を保存できませんでした",
                "ページを再読み込みしてもう一度お試しください。".to_owned(),
            ),
            ScanError::Busy => (
                StatusCode::CONFLICT,
                "読み取り中です",
                "前のレシートの解析が終わるまでお待ちください。".to_owned(),
            ),
            ScanError::NothingToReview => (
                StatusCode::CONFLICT,
                "保存する明細がありません",
                "もう一度レシートを読み取ってください。".to_owned(),
            ),
            ScanError::RateLimited(retry_after) => (
                StatusCode::BAD_GATEWAY,
                "読み取りに失敗しました",
                format!("リクエストが多すぎます。{retry_after}秒後にもう一度お試しください。"),
            ),
            ScanError::Http(_) | ScanError::Api { .. } | ScanError::MalformedResponse(_) => (
                StatusCode::BAD_GATEWAY,
                "読み取りに失敗しました",
                "レシートを解析できませんでした。別の写真でもう一度お試しください。".to_owned(),
            ),
        };

        Alert::Error {
            message: message.to_owned(),
            details,
        }
        .into_response_with_status(status_code)
    }
}

/// The error body returned by the Gemini API.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::{ApiErrorResponse, ScanError};

    #[test]
    fn error_display() {
        let error = ScanError::RateLimited(30);
        assert_eq!(error.to_string(), "rate limited, retry after 30 seconds");

        let error = ScanError::Api {
            status: "INVALID_ARGUMENT".to_owned(),
            message: "Request contains an invalid argument.".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "API error (INVALID_ARGUMENT): Request contains an invalid argument."
        );
    }

    #[test]
    fn api_error_deserialization() {
        let json = r#"{
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.error.status, "INVALID_ARGUMENT");
        assert_eq!(
            response.error.message,
            "API key not valid. Please pass a valid API key."
        );
    }

    #[test]
    fn alert_status_codes() {
        let cases = [
            (ScanError::MissingApiKey, StatusCode::BAD_REQUEST),
            (ScanError::NotAnImage("text/plain".to_owned()), StatusCode::BAD_REQUEST),
            (ScanError::Unauthorized("bad key".to_owned()), StatusCode::BAD_REQUEST),
            (ScanError::InvalidReview("3 names, 2 prices".to_owned()), StatusCode::BAD_REQUEST),
            (ScanError::Busy, StatusCode::CONFLICT),
            (ScanError::NothingToReview, StatusCode::CONFLICT),
            (ScanError::RateLimited(60), StatusCode::BAD_GATEWAY),
            (ScanError::MalformedResponse("no JSON".to_owned()), StatusCode::BAD_GATEWAY),
        ];

        for (error, want_status) in cases {
            let response = error.into_alert_response();

            assert_eq!(response.status(), want_status);
        }
    }
}
