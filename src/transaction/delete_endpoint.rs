//! Transaction deletion endpoint.

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
    database_id::TransactionId,
    sync::{ChangeFeed, Collection},
    transaction::delete_transaction,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// A route handler for deleting a transaction, responds with an alert.
///
/// The status code has to be 200 OK on success or htmx will not remove the list item.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transaction(user_id, transaction_id, &connection) {
        Ok(()) => {
            state.change_feed.publish(user_id, Collection::Transactions);

            Alert::SuccessSimple {
                message: "履歴を削除しました".to_owned(),
            }
            .into_response()
        }
        Err(Error::DeleteMissingTransaction) => {
            tracing::warn!("User {user_id} tried to delete missing transaction {transaction_id}");
            Error::DeleteMissingTransaction.into_alert_response()
        }
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}
