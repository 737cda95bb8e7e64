//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{
        create_category,
        domain::CategoryFormData,
        form::{CategoryFormAction, CategoryFormValues, category_form},
    },
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, yen_input_styles},
    navigation::NavBar,
    sync::{ChangeFeed, Collection},
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page() -> Response {
    new_category_view().into_response()
}

/// Handle category creation form submission.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let fields = match form_data.parse() {
        Ok(fields) => fields,
        Err(error) => {
            return new_category_form_view(&CategoryFormValues::from(&form_data), &error.to_string())
                .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(user_id, fields, &connection) {
        Ok(category) => {
            tracing::debug!("User {user_id} created category {}", category.id);
            state.change_feed.publish(user_id, Collection::Categories);

            (
                HxRedirect(endpoints::SETTINGS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

fn new_category_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::SETTINGS_VIEW).into_html();
    let form = new_category_form_view(&CategoryFormValues::default(), "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "カテゴリを追加" }
            (form)
        }
    };

    base("カテゴリを追加", &[yen_input_styles()], &content)
}

fn new_category_form_view(values: &CategoryFormValues<'_>, error_message: &str) -> Markup {
    category_form(
        CategoryFormAction::Create(endpoints::POST_CATEGORY),
        values,
        error_message,
    )
}
