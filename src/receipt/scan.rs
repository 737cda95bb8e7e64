//! Uploading a receipt photo and sending it to the AI to be read.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    body::Bytes,
    extract::{FromRef, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use secrecy::SecretString;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, loading_spinner},
    receipt::{
        GeminiClient, ScanError, ScanSessions, StagedReceipt, api_key::resolve_api_key,
        parse::parse_reply, prompt::build_prompt,
    },
    sync::{ChangeFeed, load_categories},
};

/// The name of the multipart field holding the photo.
const RECEIPT_FIELD: &str = "receipt";

/// The largest photo accepted, in bytes.
pub const MAX_RECEIPT_BYTES: usize = 10 * 1024 * 1024;

/// The form for uploading a receipt photo.
///
/// The form submits as soon as a photo is picked. On phones the camera opens directly.
pub fn scan_upload_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::SCAN_RECEIPT)
            hx-encoding="multipart/form-data"
            hx-trigger="change"
            hx-target-error="#alert-container"
            hx-indicator="#scan-indicator"
            hx-disabled-elt="find input"
            class="space-y-3"
        {
            label for="receipt" class=(BUTTON_PRIMARY_STYLE)
            {
                "レシートを撮影・選択"
            }

            input
                type="file"
                id="receipt"
                name=(RECEIPT_FIELD)
                accept="image/*"
                capture="environment"
                class="sr-only"
                required;

            div
                id="scan-indicator"
                class="htmx-indicator text-center text-sm text-gray-600 dark:text-gray-300"
            {
                (loading_spinner())
                "レシートを解析中..."
            }
        }
    }
}

/// The state needed to scan a receipt.
#[derive(Debug, Clone)]
pub struct ScanReceiptState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
    pub scanner: GeminiClient,
    pub scan_sessions: ScanSessions,
    /// The API key used when the user has not saved their own.
    pub default_api_key: Option<SecretString>,
}

impl FromRef<AppState> for ScanReceiptState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
            scanner: state.scanner.clone(),
            scan_sessions: state.scan_sessions.clone(),
            default_api_key: state.default_api_key.clone(),
        }
    }
}

/// Read the uploaded receipt with the AI and stage the items for review.
///
/// On success the client is redirected to the review page, otherwise an alert is returned and
/// the user's scan session is idle again.
pub async fn scan_receipt_endpoint(
    State(state): State<ScanReceiptState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    multipart: Multipart,
) -> Response {
    match scan_receipt(&state, user_id, &jar, multipart).await {
        Ok(receipt) => {
            tracing::info!(
                "Scanned {} item(s) totalling ¥{} for user {user_id}",
                receipt.items.len(),
                receipt.total()
            );

            (
                HxRedirect(endpoints::SCAN_REVIEW_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(
            error @ Error::Scan(
                ScanError::MissingApiKey | ScanError::NotAnImage(_) | ScanError::Busy,
            ),
        ) => {
            tracing::warn!("Refused receipt scan for user {user_id}: {error}");
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("Receipt scan failed for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

async fn scan_receipt(
    state: &ScanReceiptState,
    user_id: UserID,
    jar: &PrivateCookieJar,
    multipart: Multipart,
) -> Result<StagedReceipt, Error> {
    let api_key = resolve_api_key(jar, state.default_api_key.as_ref())?;
    let (mime_type, image) = read_receipt_image(multipart).await?;

    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        load_categories(user_id, &connection, &state.change_feed)?
    };

    let ticket = state.scan_sessions.begin_scan(user_id)?;
    let prompt = build_prompt(&categories);

    let result = match state
        .scanner
        .generate(&api_key, &prompt, &mime_type, &image)
        .await
    {
        Ok(reply) => {
            tracing::debug!("Scan reply for user {user_id}: {reply}");
            parse_reply(&reply, &categories)
        }
        Err(error) => Err(error),
    };

    Ok(ticket.finish(result)?)
}

async fn read_receipt_image(mut multipart: Multipart) -> Result<(String, Bytes), Error> {
    while let Some(field) = multipart.next_field().await.map_err(|error| {
        tracing::error!("Could not read multipart form field: {error}");
        Error::MultipartError(error.body_text())
    })? {
        if field.name() != Some(RECEIPT_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_owned();
        if !content_type.starts_with("image/") {
            return Err(ScanError::NotAnImage(content_type).into());
        }

        let data = field.bytes().await.map_err(|error| {
            tracing::error!("Could not read data from multipart form field: {error}");
            Error::MultipartError(error.body_text())
        })?;

        if data.is_empty() {
            return Err(ScanError::NotAnImage("an empty file".to_owned()).into());
        }

        tracing::debug!("Received {content_type} receipt that is {} bytes", data.len());

        return Ok((content_type, data));
    }

    Err(ScanError::NotAnImage("no file".to_owned()).into())
}
