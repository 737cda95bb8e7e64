//! Defines the endpoint for recording a transaction by hand.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    sync::{ChangeFeed, Collection, load_categories},
    transaction::{
        Transaction, create_transaction,
        form::{TransactionFormData, TransactionFormValues, parse_yen, transaction_form},
    },
};

/// The state needed for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// A route handler for creating a new expense.
///
/// Redirects to the dashboard on success. If the amount cannot be parsed or the
/// category is not one of the user's, the form is returned with the entered
/// values and an error message.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionFormData>,
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

    let amount = parse_yen(&form.amount).and_then(|amount| {
        if categories
            .iter()
            .any(|category| category.id == form.category_id)
        {
            Ok(amount)
        } else {
            Err(Error::UnknownCategory)
        }
    });

    let amount = match amount {
        Ok(amount) => amount,
        Err(error) => {
            return transaction_form(
                &TransactionFormValues::from(&form),
                &categories,
                Some(&error.to_string()),
            )
            .into_response();
        }
    };

    let builder = Transaction::build(user_id, amount, form.category_id, form.date)
        .item_name(&form.item_name)
        .store(Some(&form.store))
        .note(&form.note);

    match create_transaction(builder, &connection) {
        Ok(transaction) => {
            tracing::debug!("User {user_id} created transaction {}", transaction.id);
            state.change_feed.publish(user_id, Collection::Transactions);

            (
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not create transaction: {error}");
            error.into_alert_response()
        }
    }
}
