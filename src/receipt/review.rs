//! Reviewing the items read from a receipt, then saving or discarding them.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    category::Category,
    database_id::CategoryId,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, format_yen,
    },
    navigation::NavBar,
    receipt::{ScanError, ScanSessions, ScanState, StagedReceipt},
    sync::{ChangeFeed, Collection, load_categories},
    transaction::{Transaction, TransactionBuilder, create_transactions, parse_yen},
};

/// The state needed for the review page and for saving reviewed items.
#[derive(Debug, Clone)]
pub struct ScanReviewState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
    pub scan_sessions: ScanSessions,
}

impl FromRef<AppState> for ScanReviewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
            scan_sessions: state.scan_sessions.clone(),
        }
    }
}

impl FromRef<AppState> for ScanSessions {
    fn from_ref(state: &AppState) -> Self {
        state.scan_sessions.clone()
    }
}

/// Renders the scanned items as an editable list.
///
/// Redirects to the new transaction page if the user has nothing to review.
pub async fn get_scan_review_page(
    State(state): State<ScanReviewState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let ScanState::Reviewing(receipt) = state.scan_sessions.state(user_id) else {
        return Ok(Redirect::to(endpoints::NEW_TRANSACTION_VIEW).into_response());
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = load_categories(user_id, &connection, &state.change_feed)
        .inspect_err(|error| tracing::error!("Could not load categories for user {user_id}: {error}"))?;

    Ok(review_view(&receipt, &categories).into_response())
}

fn review_view(receipt: &StagedReceipt, categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class=(CARD_STYLE)
            {
                h1 class="text-lg font-bold mb-4" { "読み取り結果の確認" }

                form
                    id="scan-review-form"
                    hx-post=(endpoints::COMMIT_SCAN)
                    hx-target-error="#alert-container"
                    hx-disabled-elt="find button[type=submit]"
                    class="space-y-4"
                {
                    div class="grid grid-cols-2 gap-3"
                    {
                        div
                        {
                            label for="date" class=(FORM_LABEL_STYLE) { "日付" }
                            input
                                id="date"
                                type="date"
                                name="date"
                                value=(receipt.date)
                                required
                                class=(FORM_TEXT_INPUT_STYLE);
                        }

                        div
                        {
                            label for="store" class=(FORM_LABEL_STYLE) { "店名" }
                            input
                                id="store"
                                type="text"
                                name="store"
                                value=(receipt.store)
                                class=(FORM_TEXT_INPUT_STYLE);
                        }
                    }

                    ul class="space-y-3"
                    {
                        @for (index, item) in receipt.items.iter().enumerate() {
                            li
                                data-scanned-item
                                class="grid grid-cols-6 gap-2 items-center border-b pb-3 dark:border-gray-700"
                            {
                                input
                                    type="text"
                                    name="name"
                                    aria-label={ "品名 " (index + 1) }
                                    value=(item.name)
                                    required
                                    class={ "col-span-4 " (FORM_TEXT_INPUT_STYLE) };

                                input
                                    type="text"
                                    name="price"
                                    inputmode="numeric"
                                    aria-label={ "金額 " (index + 1) }
                                    value=(item.price)
                                    required
                                    class={ "col-span-2 text-right " (FORM_TEXT_INPUT_STYLE) };

                                select
                                    name="category_id"
                                    aria-label={ "カテゴリ " (index + 1) }
                                    class={ "col-span-6 " (FORM_TEXT_INPUT_STYLE) }
                                {
                                    @for category in categories {
                                        option
                                            value=(category.id)
                                            selected[category.id == item.category_id]
                                        {
                                            (category.icon) " " (category.name)
                                        }
                                    }
                                }
                            }
                        }
                    }

                    p class="flex justify-between font-bold"
                    {
                        span { "合計 (" (receipt.items.len()) "点)" }
                        span data-review-total { (format_yen(receipt.total())) }
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "まとめて保存" }
                }

                button
                    type="button"
                    hx-post=(endpoints::CANCEL_SCAN)
                    hx-target-error="#alert-container"
                    class={ "mt-3 " (BUTTON_SECONDARY_STYLE) }
                {
                    "キャンセル"
                }
            }
        }
    };

    base("読み取り結果", &[], &content)
}

/// The reviewed items, one entry per item in each list.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewFormData {
    pub date: Date,
    #[serde(default)]
    pub store: String,
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub price: Vec<String>,
    #[serde(default)]
    pub category_id: Vec<CategoryId>,
}

impl ReviewFormData {
    /// Turn the form into one expense per item, all sharing the store and date.
    ///
    /// Every item must be in one of `categories`.
    fn into_transactions(
        self,
        user_id: UserID,
        categories: &[Category],
    ) -> Result<Vec<TransactionBuilder>, Error> {
        let item_count = self.name.len();

        if item_count == 0 {
            return Err(ScanError::InvalidReview("no items".to_owned()).into());
        }

        if self.price.len() != item_count || self.category_id.len() != item_count {
            return Err(ScanError::InvalidReview(format!(
                "{item_count} names, {} prices and {} categories",
                self.price.len(),
                self.category_id.len()
            ))
            .into());
        }

        let store = self.store.trim();

        self.name
            .iter()
            .zip(&self.price)
            .zip(&self.category_id)
            .map(|((name, price), category_id)| {
                let amount = parse_yen(price)?;

                if !categories
                    .iter()
                    .any(|category| category.id == *category_id)
                {
                    return Err(ScanError::InvalidReview(format!(
                        "\"{name}\" has an unknown category"
                    ))
                    .into());
                }

                Ok(Transaction::build(user_id, amount, *category_id, self.date)
                    .item_name(name.trim())
                    .store(Some(store)))
            })
            .collect()
    }
}

/// Save every reviewed item as an expense in one go.
///
/// On success the client is redirected to the transaction history. If saving fails the items stay
/// up for review.
pub async fn commit_scan_endpoint(
    State(state): State<ScanReviewState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ReviewFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let categories = match load_categories(user_id, &connection, &state.change_feed) {
        Ok(categories) => categories,
        Err(error) => {
            tracing::error!("Could not load categories for user {user_id}: {error}");
            return error.into_alert_response();
        }
    };

    let builders = match form.into_transactions(user_id, &categories) {
        Ok(builders) => builders,
        Err(error) => {
            tracing::warn!("Invalid scan review from user {user_id}: {error}");
            return error.into_alert_response();
        }
    };

    let Some(receipt) = state.scan_sessions.take_staged(user_id) else {
        tracing::warn!("User {user_id} tried to save a scan with nothing to review");
        return Error::from(ScanError::NothingToReview).into_alert_response();
    };

    match create_transactions(builders, &connection) {
        Ok(transactions) => {
            tracing::info!(
                "Saved {} scanned item(s) for user {user_id}",
                transactions.len()
            );
            state.change_feed.publish(user_id, Collection::Transactions);

            (
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not save scanned items for user {user_id}: {error}");
            state.scan_sessions.restore_staged(user_id, receipt);
            error.into_alert_response()
        }
    }
}

/// Discard the scanned items without saving anything.
pub async fn cancel_scan_endpoint(
    State(scan_sessions): State<ScanSessions>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    if scan_sessions.cancel(user_id) {
        tracing::info!("User {user_id} discarded a scanned receipt");
    }

    (
        HxRedirect(endpoints::NEW_TRANSACTION_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod review_page_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        auth::UserID,
        endpoints,
        receipt::{ScanSessions, ScannedItem, StagedReceipt},
        test_utils::{
            TestLedger, assert_hx_endpoint, assert_valid_html, get_header, parse_html_document,
        },
    };

    use super::{ScanReviewState, get_scan_review_page};

    fn get_state(ledger: &TestLedger) -> ScanReviewState {
        ScanReviewState {
            db_connection: ledger.db_connection.clone(),
            change_feed: ledger.change_feed.clone(),
            scan_sessions: ScanSessions::new(),
        }
    }

    fn stage(state: &ScanReviewState, user_id: UserID, receipt: StagedReceipt) {
        state
            .scan_sessions
            .begin_scan(user_id)
            .unwrap()
            .finish(Ok(receipt))
            .unwrap();
    }

    #[tokio::test]
    async fn redirects_when_nothing_to_review() {
        let ledger = TestLedger::with_default_categories();

        let response = get_scan_review_page(State(get_state(&ledger)), Extension(ledger.user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, "location"), endpoints::NEW_TRANSACTION_VIEW);
    }

    #[tokio::test]
    async fn shows_editable_items() {
        let ledger = TestLedger::with_default_categories();
        let categories = ledger.categories();
        let state = get_state(&ledger);
        stage(
            &state,
            ledger.user_id,
            StagedReceipt {
                store: "スーパー".to_owned(),
                date: date!(2026 - 10 - 18),
                items: vec![
                    ScannedItem {
                        name: "牛乳".to_owned(),
                        price: 198,
                        category_id: categories[0].id,
                    },
                    ScannedItem {
                        name: "洗剤".to_owned(),
                        price: 348,
                        category_id: categories[1].id,
                    },
                ],
            },
        );

        let response = get_scan_review_page(State(state), Extension(ledger.user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = html
            .select(&Selector::parse("form#scan-review-form").unwrap())
            .next()
            .expect("No review form found");
        assert_hx_endpoint(&form, endpoints::COMMIT_SCAN, "hx-post");

        let items: Vec<_> = form
            .select(&Selector::parse("li[data-scanned-item]").unwrap())
            .collect();
        assert_eq!(items.len(), 2);

        let name = Selector::parse("input[name=name]").unwrap();
        let price = Selector::parse("input[name=price]").unwrap();
        let selected = Selector::parse("select[name=category_id] option[selected]").unwrap();
        assert_eq!(items[1].select(&name).next().unwrap().value().attr("value"), Some("洗剤"));
        assert_eq!(items[1].select(&price).next().unwrap().value().attr("value"), Some("348"));
        assert_eq!(
            items[1].select(&selected).next().unwrap().value().attr("value"),
            Some(categories[1].id.to_string().as_str())
        );

        let store = form
            .select(&Selector::parse("input[name=store]").unwrap())
            .next()
            .unwrap();
        assert_eq!(store.value().attr("value"), Some("スーパー"));
        let text = form.text().collect::<String>();
        assert!(text.contains("合計 (2点)"), "got {text}");
        assert!(text.contains("まとめて保存"));

        let cancel = html
            .select(&Selector::parse("button[hx-post]").unwrap())
            .next()
            .expect("No cancel button found");
        assert_eq!(cancel.value().attr("hx-post"), Some(endpoints::CANCEL_SCAN));
    }
}

#[cfg(test)]
mod commit_scan_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        endpoints,
        receipt::{ScanSessions, ScanState, ScannedItem, StagedReceipt},
        sync::Collection,
        test_utils::{TestLedger, assert_hx_redirect},
        transaction::{TransactionKind, get_transactions},
    };

    use super::{ReviewFormData, ScanReviewState, cancel_scan_endpoint, commit_scan_endpoint};

    fn get_state(ledger: &TestLedger) -> ScanReviewState {
        ScanReviewState {
            db_connection: ledger.db_connection.clone(),
            change_feed: ledger.change_feed.clone(),
            scan_sessions: ScanSessions::new(),
        }
    }

    fn staged(ledger: &TestLedger) -> StagedReceipt {
        let category_id = ledger.categories()[0].id;

        StagedReceipt {
            store: "スーパー".to_owned(),
            date: date!(2026 - 10 - 18),
            items: vec![
                ScannedItem {
                    name: "牛乳".to_owned(),
                    price: 198,
                    category_id,
                },
                ScannedItem {
                    name: "洗剤".to_owned(),
                    price: 348,
                    category_id,
                },
            ],
        }
    }

    fn stage(state: &ScanReviewState, ledger: &TestLedger) {
        state
            .scan_sessions
            .begin_scan(ledger.user_id)
            .unwrap()
            .finish(Ok(staged(ledger)))
            .unwrap();
    }

    fn edited_form(ledger: &TestLedger) -> ReviewFormData {
        let categories = ledger.categories();

        ReviewFormData {
            date: date!(2026 - 10 - 17),
            store: "ドラッグストア".to_owned(),
            name: vec!["牛乳".to_owned(), "柔軟剤".to_owned(), "ガム".to_owned()],
            price: vec!["198".to_owned(), "４９８".to_owned(), "0".to_owned()],
            category_id: vec![categories[0].id, categories[1].id, categories[0].id],
        }
    }

    #[tokio::test]
    async fn saves_every_edited_item() {
        let ledger = TestLedger::with_default_categories();
        let state = get_state(&ledger);
        stage(&state, &ledger);
        let mut changes = ledger.change_feed.subscribe();

        let response = commit_scan_endpoint(
            State(state.clone()),
            Extension(ledger.user_id),
            Form(edited_form(&ledger)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        assert_eq!(state.scan_sessions.state(ledger.user_id), ScanState::Idle);

        let mut transactions = get_transactions(ledger.user_id, &ledger.connection()).unwrap();
        transactions.sort_by_key(|transaction| transaction.amount);
        assert_eq!(transactions.len(), 3);
        let amounts: Vec<_> = transactions.iter().map(|transaction| transaction.amount).collect();
        assert_eq!(amounts, vec![0, 198, 498]);
        for transaction in &transactions {
            assert_eq!(transaction.kind, TransactionKind::Expense);
            assert_eq!(transaction.store.as_deref(), Some("ドラッグストア"));
            assert_eq!(transaction.date, date!(2026 - 10 - 17));
        }
        assert_eq!(changes.try_recv().unwrap().collection, Collection::Transactions);
    }

    #[tokio::test]
    async fn invalid_price_keeps_items_for_review() {
        let ledger = TestLedger::with_default_categories();
        let state = get_state(&ledger);
        stage(&state, &ledger);
        let mut form = edited_form(&ledger);
        form.price[1] = "abc".to_owned();

        let response =
            commit_scan_endpoint(State(state.clone()), Extension(ledger.user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            state.scan_sessions.state(ledger.user_id),
            ScanState::Reviewing(staged(&ledger))
        );
        assert!(get_transactions(ledger.user_id, &ledger.connection()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatched_lists_are_rejected() {
        let ledger = TestLedger::with_default_categories();
        let state = get_state(&ledger);
        stage(&state, &ledger);
        let mut form = edited_form(&ledger);
        form.category_id.pop();

        let response =
            commit_scan_endpoint(State(state.clone()), Extension(ledger.user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(get_transactions(ledger.user_id, &ledger.connection()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_users_category_keeps_items_for_review() {
        let ledger = TestLedger::with_default_categories();
        let state = get_state(&ledger);
        stage(&state, &ledger);
        let mut form = edited_form(&ledger);
        form.category_id[2] = ledger.foreign_category();

        let response =
            commit_scan_endpoint(State(state.clone()), Extension(ledger.user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            state.scan_sessions.state(ledger.user_id),
            ScanState::Reviewing(staged(&ledger))
        );
        assert!(get_transactions(ledger.user_id, &ledger.connection()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn nothing_staged_is_a_conflict() {
        let ledger = TestLedger::with_default_categories();
        let state = get_state(&ledger);

        let response = commit_scan_endpoint(
            State(state),
            Extension(ledger.user_id),
            Form(edited_form(&ledger)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(get_transactions(ledger.user_id, &ledger.connection()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_discards_without_saving() {
        let ledger = TestLedger::with_default_categories();
        let state = get_state(&ledger);
        stage(&state, &ledger);

        let response =
            cancel_scan_endpoint(State(state.scan_sessions.clone()), Extension(ledger.user_id))
                .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::NEW_TRANSACTION_VIEW);
        assert_eq!(state.scan_sessions.state(ledger.user_id), ScanState::Idle);
        assert!(get_transactions(ledger.user_id, &ledger.connection()).unwrap().is_empty());
    }
}
