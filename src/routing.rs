//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        get_log_in_page, get_log_out, post_log_in, session_guard, session_guard_hx,
        upgrade_account_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_edit_category_page,
        get_new_category_page, update_category_endpoint,
    },
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    receipt::{
        MAX_RECEIPT_BYTES, cancel_scan_endpoint, commit_scan_endpoint, get_scan_review_page,
        save_api_key_endpoint, scan_receipt_endpoint,
    },
    settings::get_settings_page,
    sync::get_events,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_new_transaction_page,
        get_transactions_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::NEW_TRANSACTION_VIEW, get(get_new_transaction_page))
        .route(endpoints::SCAN_REVIEW_VIEW, get(get_scan_review_page))
        .route(endpoints::SETTINGS_VIEW, get(get_settings_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .route(endpoints::EVENTS, get(get_events))
        .layer(middleware::from_fn_with_state(state.clone(), session_guard));

    // These routes are called by HTMX and need the HX-Redirect header for session errors.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::DELETE_TRANSACTION,
                delete(delete_transaction_endpoint),
            )
            .route(endpoints::POST_CATEGORY, post(create_category_endpoint))
            .route(endpoints::PUT_CATEGORY, put(update_category_endpoint))
            .route(endpoints::DELETE_CATEGORY, delete(delete_category_endpoint))
            .route(
                endpoints::SCAN_RECEIPT,
                post(scan_receipt_endpoint).layer(DefaultBodyLimit::max(MAX_RECEIPT_BYTES)),
            )
            .route(endpoints::COMMIT_SCAN, post(commit_scan_endpoint))
            .route(endpoints::CANCEL_SCAN, post(cancel_scan_endpoint))
            .route(endpoints::API_KEY, post(save_api_key_endpoint))
            .route(endpoints::UPGRADE_ACCOUNT, post(upgrade_account_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), session_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
