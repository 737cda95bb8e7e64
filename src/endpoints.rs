//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/categories/{category_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page with the period summary.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying a user's transaction history.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for recording a new transaction or scanning a receipt.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for reviewing the items extracted from a receipt.
pub const SCAN_REVIEW_VIEW: &str = "/scan/review";
/// The page for managing categories, the API key and the account.
pub const SETTINGS_VIEW: &str = "/settings";
/// The page for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page for editing an existing category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in to an existing account.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for attaching credentials to an anonymous account.
pub const UPGRADE_ACCOUNT: &str = "/api/account/upgrade";
/// The route to create a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to delete a single transaction.
pub const DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create a category.
pub const POST_CATEGORY: &str = "/api/categories";
/// The route to update a category.
pub const PUT_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to delete a category.
pub const DELETE_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to upload a receipt image for scanning.
pub const SCAN_RECEIPT: &str = "/api/scan";
/// The route to save the reviewed receipt items as transactions.
pub const COMMIT_SCAN: &str = "/api/scan/commit";
/// The route to discard the reviewed receipt items.
pub const CANCEL_SCAN: &str = "/api/scan/cancel";
/// The route to save the user's Gemini API key.
pub const API_KEY: &str = "/api/settings/api_key";
/// The server-sent event stream of changes to the user's data.
pub const EVENTS: &str = "/api/events";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/categories/{category_id}', '{category_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
