//! Category deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    category::db::delete_category,
    database_id::CategoryId,
    sync::{ChangeFeed, Collection},
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// Handle category deletion. Returns success alert or error.
///
/// Transactions in the deleted category are kept and shown as uncategorised.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<DeleteCategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(user_id, category_id, &connection) {
        Ok(_) => {
            state.change_feed.publish(user_id, Collection::Categories);

            Alert::SuccessSimple {
                message: "カテゴリを削除しました".to_owned(),
            }
            .into_response()
        }
        Err(Error::DeleteMissingCategory) => Error::DeleteMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
