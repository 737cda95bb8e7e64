//! Category editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
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
        domain::CategoryFormData,
        form::{CategoryFormAction, CategoryFormValues, category_form},
        get_category, update_category,
    },
    database_id::CategoryId,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, yen_input_styles},
    navigation::NavBar,
    sync::{ChangeFeed, Collection},
};

/// The state needed for the edit category page.
#[derive(Debug, Clone)]
pub struct EditCategoryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating a category.
#[derive(Debug, Clone)]
pub struct UpdateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for UpdateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// Render the category editing page.
pub async fn get_edit_category_page(
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = get_category(user_id, category_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve category {category_id}: {error}");
        }
    })?;

    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);

    Ok(edit_category_view(&update_endpoint, &CategoryFormValues::from(&category)).into_response())
}

/// Handle category update form submission.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<UpdateCategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);

    let fields = match form_data.parse() {
        Ok(fields) => fields,
        Err(error) => {
            return category_form(
                CategoryFormAction::Update(&update_endpoint),
                &CategoryFormValues::from(&form_data),
                &error.to_string(),
            )
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

    match update_category(user_id, category_id, fields, &connection) {
        Ok(_) => {
            state.change_feed.publish(user_id, Collection::Categories);

            (
                HxRedirect(endpoints::SETTINGS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::UpdateMissingCategory) => Error::UpdateMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_category_view(update_endpoint: &str, values: &CategoryFormValues<'_>) -> Markup {
    let nav_bar = NavBar::new(endpoints::SETTINGS_VIEW).into_html();
    let form = category_form(CategoryFormAction::Update(update_endpoint), values, "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "カテゴリを編集" }
            (form)
        }
    };

    base("カテゴリを編集", &[yen_input_styles()], &content)
}


#[cfg(test)]
mod update_category_endpoint_tests {
    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        category::{CategoryColor, domain::CategoryFormData, get_category},
        endpoints,
        test_utils::{TestLedger, assert_hx_redirect},
    };

    use super::{UpdateCategoryState, update_category_endpoint};

    fn get_state(ledger: &TestLedger) -> UpdateCategoryState {
        UpdateCategoryState {
            db_connection: ledger.db_connection.clone(),
            change_feed: ledger.change_feed.clone(),
        }
    }

    fn form(name: &str, budget: &str) -> CategoryFormData {
        CategoryFormData {
            name: name.to_owned(),
            icon: "🍙".to_owned(),
            color: "rose".to_owned(),
            budget: budget.to_owned(),
        }
    }

    #[tokio::test]
    async fn can_update_category() {
        let ledger = TestLedger::with_default_categories();
        let category = ledger.categories()[0].clone();

        let response = update_category_endpoint(
            Path(category.id),
            State(get_state(&ledger)),
            Extension(ledger.user_id),
            Form(form("ごはん", "45000")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::SETTINGS_VIEW);
        let updated = get_category(ledger.user_id, category.id, &ledger.connection()).unwrap();
        assert_eq!(updated.name.as_ref(), "ごはん");
        assert_eq!(updated.icon.as_ref(), "🍙");
        assert_eq!(updated.color, CategoryColor::Rose);
        assert_eq!(updated.budget, 45000);
    }

    #[tokio::test]
    async fn update_missing_category_returns_not_found_alert() {
        let ledger = TestLedger::new();

        let response = update_category_endpoint(
            Path(999),
            State(get_state(&ledger)),
            Extension(ledger.user_id),
            Form(form("ごはん", "45000")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
