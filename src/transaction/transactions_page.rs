//! Defines the route handler for the page that lists the user's transactions.

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
    category::{CategoryColor, UNKNOWN_CATEGORY_ICON, UNKNOWN_CATEGORY_NAME},
    endpoints,
    html::{CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, delete_button, format_yen},
    navigation::NavBar,
    sync::{ChangeFeed, LedgerView},
    transaction::Transaction,
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// A transaction with everything needed to render it.
struct TransactionRow<'a> {
    transaction: &'a Transaction,
    category_icon: &'a str,
    category_name: &'a str,
    category_color: CategoryColor,
    delete_url: String,
}

/// Render the user's transactions, newest first.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let view = LedgerView::load(user_id, &connection, &state.change_feed)
        .inspect_err(|error| tracing::error!("Could not load transactions for user {user_id}: {error}"))?;

    let rows: Vec<TransactionRow> = view
        .transactions
        .iter()
        .map(|transaction| {
            let category = view.category(transaction.category_id);

            TransactionRow {
                transaction,
                category_icon: category
                    .map(|category| category.icon.as_ref())
                    .unwrap_or(UNKNOWN_CATEGORY_ICON),
                category_name: category
                    .map(|category| category.name.as_ref())
                    .unwrap_or(UNKNOWN_CATEGORY_NAME),
                category_color: category
                    .map(|category| category.color)
                    .unwrap_or(CategoryColor::Gray),
                delete_url: endpoints::format_endpoint(
                    endpoints::DELETE_TRANSACTION,
                    transaction.id,
                ),
            }
        })
        .collect();

    Ok(transactions_view(&rows).into_response())
}

fn transaction_row_view(row: &TransactionRow) -> Markup {
    let transaction = row.transaction;
    let title = if transaction.item_name.is_empty() {
        row.category_name
    } else {
        transaction.item_name.as_str()
    };

    html! {
        li
            class="flex items-center gap-3 py-3"
            data-transaction-row="true"
        {
            span
                class={ "flex h-10 w-10 shrink-0 items-center justify-center rounded-full text-xl "
                    (row.category_color.badge_style()) }
                title=(row.category_name)
            {
                (row.category_icon)
            }

            div class="min-w-0 flex-1"
            {
                p class="truncate font-medium" { (title) }

                p class="truncate text-xs text-gray-500 dark:text-gray-400"
                {
                    time datetime=(transaction.date.to_string()) { (transaction.date) }
                    " · " (row.category_name)

                    @if let Some(store) = &transaction.store {
                        " · " (store)
                    }
                }

                @if !transaction.note.is_empty() {
                    p class="truncate text-xs text-gray-400" { (transaction.note) }
                }
            }

            div class="flex shrink-0 flex-col items-end gap-1"
            {
                span class="font-bold tabular-nums" { (format_yen(transaction.amount)) }

                (delete_button(&row.delete_url, "この履歴を削除しますか？", "closest li"))
            }
        }
    }
}

fn transactions_view(rows: &[TransactionRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE) data-live-refresh
        {
            section class={ (CARD_STYLE) " space-y-2" }
            {
                h1 class="text-xl font-bold" { "履歴" }

                @if rows.is_empty() {
                    p class="py-6 text-center text-gray-500 dark:text-gray-400"
                    {
                        "まだ記録がありません。"
                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                        {
                            "最初の支出を記録する"
                        }
                    }
                } @else {
                    ul
                        id="transaction-list"
                        class="divide-y divide-pink-100 dark:divide-gray-700"
                    {
                        @for row in rows {
                            (transaction_row_view(row))
                        }
                    }
                }
            }
        }
    };

    base("履歴", &[], &content)
}

#[cfg(test)]
mod transactions_page_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::{ElementRef, Html, Selector};

    use crate::{
        category::{UNKNOWN_CATEGORY_ICON, UNKNOWN_CATEGORY_NAME, delete_category},
        endpoints,
        test_utils::{TestLedger, assert_valid_html, parse_date, parse_html_document},
        transaction::{Transaction, create_transaction},
    };

    use super::{TransactionsPageState, get_transactions_page};

    fn get_state(ledger: &TestLedger) -> TransactionsPageState {
        TransactionsPageState {
            db_connection: ledger.db_connection.clone(),
            change_feed: ledger.change_feed.clone(),
        }
    }

    async fn render_page(ledger: &TestLedger) -> Html {
        let response = get_transactions_page(State(get_state(ledger)), Extension(ledger.user_id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        html
    }

    fn rows(html: &Html) -> Vec<ElementRef<'_>> {
        html.select(&Selector::parse("li[data-transaction-row]").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn shows_empty_state_without_transactions() {
        let ledger = TestLedger::new();

        let html = render_page(&ledger).await;

        assert!(rows(&html).is_empty());
        let link = html
            .select(&Selector::parse("main a").unwrap())
            .next()
            .expect("No link to the entry page");
        assert_eq!(
            link.value().attr("href"),
            Some(endpoints::NEW_TRANSACTION_VIEW)
        );
    }

    #[tokio::test]
    async fn lists_transactions_newest_first() {
        let ledger = TestLedger::with_default_categories();
        let category_id = ledger.categories()[0].id;
        let older = ledger.add_expense(500, category_id, "2026-09-30");
        let newer = ledger.add_expense(800, category_id, "2026-10-02");

        let html = render_page(&ledger).await;

        let delete_urls: Vec<_> = rows(&html)
            .iter()
            .map(|row| {
                row.select(&Selector::parse("button[hx-delete]").unwrap())
                    .next()
                    .expect("No delete button")
                    .value()
                    .attr("hx-delete")
                    .unwrap()
                    .to_owned()
            })
            .collect();
        assert_eq!(
            delete_urls,
            vec![
                endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, newer.id),
                endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, older.id),
            ]
        );
    }

    #[tokio::test]
    async fn row_shows_details_and_confirms_delete() {
        let ledger = TestLedger::with_default_categories();
        let category = ledger.categories()[0].clone();
        create_transaction(
            Transaction::build(ledger.user_id, 1280, category.id, parse_date("2026-10-05"))
                .item_name("ケーキ")
                .store(Some("パティスリー"))
                .note("誕生日"),
            &ledger.connection(),
        )
        .unwrap();

        let html = render_page(&ledger).await;

        let rows = rows(&html);
        assert_eq!(rows.len(), 1);
        let text = rows[0].text().collect::<String>();
        let wants = [
            "ケーキ",
            "パティスリー",
            "誕生日",
            "2026-10-05",
            category.name.as_ref(),
            category.icon.as_ref(),
        ];
        for want in wants {
            assert!(text.contains(want), "want row to contain {want:?}, got {text:?}");
        }
        let button = rows[0]
            .select(&Selector::parse("button[hx-delete]").unwrap())
            .next()
            .unwrap();
        assert_eq!(button.value().attr("hx-confirm"), Some("この履歴を削除しますか？"));
        assert_eq!(button.value().attr("hx-target"), Some("closest li"));
        assert_eq!(button.value().attr("hx-swap"), Some("delete"));
    }

    #[tokio::test]
    async fn deleted_category_renders_as_unknown() {
        let ledger = TestLedger::with_default_categories();
        let category_id = ledger.categories()[2].id;
        ledger.add_expense(300, category_id, "2026-10-05");
        delete_category(ledger.user_id, category_id, &ledger.connection()).unwrap();

        let html = render_page(&ledger).await;

        let text = rows(&html)[0].text().collect::<String>();
        assert!(text.contains(UNKNOWN_CATEGORY_ICON), "got {text:?}");
        assert!(text.contains(UNKNOWN_CATEGORY_NAME), "got {text:?}");
    }

    #[tokio::test]
    async fn main_is_live_refreshed() {
        let ledger = TestLedger::new();

        let html = render_page(&ledger).await;

        assert!(
            html.select(&Selector::parse("main[data-live-refresh]").unwrap())
                .next()
                .is_some()
        );
    }
}
