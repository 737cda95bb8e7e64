//! Defines the route handler for the page for recording a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::Category,
    endpoints,
    html::{CARD_STYLE, PAGE_CONTAINER_STYLE, base, yen_input_styles},
    navigation::NavBar,
    receipt::scan_upload_form,
    sync::{ChangeFeed, load_categories},
    timezone::local_today,
    transaction::form::{TransactionFormValues, transaction_form},
};

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Tokyo".
    pub local_timezone: String,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Renders the page for recording a transaction by hand or by scanning a receipt.
pub async fn get_new_transaction_page(
    State(state): State<NewTransactionPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = load_categories(user_id, &connection, &state.change_feed)
        .inspect_err(|error| tracing::error!("Could not load categories for user {user_id}: {error}"))?;

    Ok(new_transaction_view(&TransactionFormValues::empty(today), &categories).into_response())
}

fn new_transaction_view(values: &TransactionFormValues<'_>, categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full space-y-6"
            {
                section class=(CARD_STYLE)
                {
                    h2 class="text-lg font-bold mb-3" { "📷 レシートを読み取る" }
                    (scan_upload_form())
                }

                section class=(CARD_STYLE)
                {
                    h2 class="text-lg font-bold mb-3" { "✏️ 手入力" }
                    (transaction_form(values, categories, None))
                }
            }
        }
    };

    base("入力", &[yen_input_styles()], &content)
}

#[cfg(test)]
mod new_transaction_page_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::Selector;

    use crate::{
        category::DEFAULT_CATEGORIES,
        endpoints,
        test_utils::{
            TestLedger, assert_form_input, assert_hx_endpoint, assert_valid_html,
            parse_html_document,
        },
        timezone::local_today,
    };

    use super::{NewTransactionPageState, get_new_transaction_page};

    fn get_state(ledger: &TestLedger) -> NewTransactionPageState {
        NewTransactionPageState {
            db_connection: ledger.db_connection.clone(),
            change_feed: ledger.change_feed.clone(),
            local_timezone: "Asia/Tokyo".to_owned(),
        }
    }

    #[tokio::test]
    async fn page_shows_entry_form_with_seeded_categories() {
        let ledger = TestLedger::new();

        let response = get_new_transaction_page(State(get_state(&ledger)), Extension(ledger.user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = html
            .select(&Selector::parse("form#transaction-form").unwrap())
            .next()
            .expect("No entry form found");
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "amount", "text");
        assert_form_input(&form, "date", "date");
        let category_inputs = form
            .select(&Selector::parse("input[name=category_id]").unwrap())
            .count();
        assert_eq!(category_inputs, DEFAULT_CATEGORIES.len());
    }

    #[tokio::test]
    async fn date_defaults_to_today() {
        let ledger = TestLedger::new();

        let response = get_new_transaction_page(State(get_state(&ledger)), Extension(ledger.user_id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let date_input = html
            .select(&Selector::parse("input[name=date]").unwrap())
            .next()
            .unwrap();
        assert_eq!(
            date_input.value().attr("value"),
            Some(local_today("Asia/Tokyo").unwrap().to_string().as_str())
        );
    }

    #[tokio::test]
    async fn page_has_receipt_upload_form() {
        let ledger = TestLedger::new();

        let response = get_new_transaction_page(State(get_state(&ledger)), Extension(ledger.user_id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let upload_form = html
            .select(&Selector::parse("form[hx-encoding='multipart/form-data']").unwrap())
            .next()
            .expect("No upload form found");
        assert_hx_endpoint(&upload_form, endpoints::SCAN_RECEIPT, "hx-post");
    }
}
