//! The settings page: categories, the Gemini API key and the account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{User, UserID, get_user_by_id, upgrade_form},
    category::Category,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_SECONDARY_STYLE, CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base,
        delete_button, format_yen,
    },
    navigation::NavBar,
    receipt::{api_key_form, has_saved_api_key},
    sync::{ChangeFeed, load_categories},
};

/// The state needed for the settings page.
#[derive(Debug, Clone)]
pub struct SettingsState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for SettingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// Renders the settings page.
pub async fn get_settings_page(
    State(state): State<SettingsState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = load_categories(user_id, &connection, &state.change_feed)
        .inspect_err(|error| tracing::error!("Could not load categories for user {user_id}: {error}"))?;
    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get user {user_id}: {error}"))?;

    Ok(settings_view(&categories, has_saved_api_key(&jar), &user).into_response())
}

fn settings_view(categories: &[Category], has_api_key: bool, user: &User) -> Markup {
    let nav_bar = NavBar::new(endpoints::SETTINGS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE) data-live-refresh
        {
            div class="w-full space-y-6"
            {
                section class=(CARD_STYLE) id="api-key"
                {
                    h2 class="text-sm font-bold text-gray-700 dark:text-gray-200 mb-3"
                    {
                        "🔑 Gemini API キー"
                    }
                    (api_key_form(has_api_key))
                }

                section class=(CARD_STYLE) id="categories"
                {
                    div class="flex justify-between items-center mb-3"
                    {
                        h2 class="text-sm font-bold text-gray-700 dark:text-gray-200"
                        {
                            "カテゴリ一覧"
                        }
                        a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE) { "+ 新規" }
                    }

                    ul class="divide-y dark:divide-gray-700"
                    {
                        @for category in categories {
                            (category_row(category))
                        }
                    }
                }

                section class=(CARD_STYLE) id="account"
                {
                    h2 class="text-sm font-bold text-gray-700 dark:text-gray-200 mb-3"
                    {
                        "アカウント"
                    }
                    (account_section(user))
                }
            }
        }
    };

    base("設定", &[], &content)
}

fn category_row(category: &Category) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id);
    let delete_url = format_endpoint(endpoints::DELETE_CATEGORY, category.id);

    html! {
        li class="flex items-center gap-3 py-3" data-category-id=(category.id)
        {
            span
                class={ "w-10 h-10 flex items-center justify-center rounded-full text-xl "
                    (category.color.badge_style()) }
            {
                (category.icon)
            }

            div class="flex-1"
            {
                p class="font-bold" { (category.name) }
                p class="text-xs text-gray-500 dark:text-gray-400"
                {
                    "予算: " (format_yen(category.budget))
                }
            }

            a href=(edit_url) class=(LINK_STYLE) { "編集" }

            (delete_button(&delete_url, "カテゴリを削除しますか？", "closest li"))
        }
    }
}

fn account_section(user: &User) -> Markup {
    match user.email() {
        Some(email) => html! {
            p class="text-sm mb-3" { "ログイン済み (" (email) ")" }

            button
                type="button"
                hx-get=(endpoints::LOG_OUT)
                hx-target-error="#alert-container"
                class=(BUTTON_SECONDARY_STYLE)
            {
                "ログアウト"
            }
        },
        None => html! {
            p class="text-sm text-gray-600 dark:text-gray-300 mb-3"
            {
                "現在はゲスト利用です。メールアドレスとパスワードを登録すると、"
                "他の端末からもデータにアクセスできます。"
            }

            (upgrade_form("", None))

            p class="text-sm mt-3"
            {
                "既にアカウントをお持ちの方は "
                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "ログイン" }
            }
        },
    }
}
