//! Dashboard HTTP handler and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, Month};

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::{
        aggregation::{PeriodSummary, summarize},
        cards::{category_cards, period_selector, remaining_card},
        period::{Granularity, Period, YEARS},
    },
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    sync::{ChangeFeed, LedgerView},
    timezone::local_today,
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Tokyo".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The period to show, e.g. `?mode=year&year=2026&month=10`.
///
/// Missing values default to the current month.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub mode: Option<Granularity>,
    pub year: Option<i32>,
    pub month: Option<u8>,
}

impl DashboardQuery {
    /// The period described by the query, filling gaps from `today`.
    ///
    /// A month outside 1-12 or a year outside [YEARS] is ignored.
    fn period(&self, today: Date) -> Period {
        let default = Period::containing(today, self.mode.unwrap_or_default());

        Period {
            year: self
                .year
                .filter(|year| YEARS.contains(year))
                .unwrap_or(default.year),
            month: self
                .month
                .and_then(|month| Month::try_from(month).ok())
                .unwrap_or(default.month),
            ..default
        }
    }
}

/// Display the spending summary for a month or a year.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let period = query.period(today);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let view = LedgerView::load(user_id, &connection, &state.change_feed)
        .inspect_err(|error| tracing::error!("Could not load dashboard data for user {user_id}: {error}"))?;
    drop(connection);

    let summary = summarize(&view.transactions, &view.categories, period);

    Ok(dashboard_view(&summary, period).into_response())
}

fn dashboard_view(summary: &PeriodSummary, period: Period) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main
            class=(PAGE_CONTAINER_STYLE)
            data-live-refresh
        {
            div class="w-full space-y-6"
            {
                (period_selector(period))

                (remaining_card(summary, period))

                @if summary.categories.is_empty() {
                    p class="text-center text-gray-500 dark:text-gray-400"
                    {
                        "カテゴリがありません。"
                        a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE)
                        {
                            "カテゴリを追加する"
                        }
                    }
                } @else {
                    (category_cards(&summary.categories))
                }
            }
        }
    };

    base("ホーム", &[], &content)
}
