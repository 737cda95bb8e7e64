//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments. Forms that use `hx-target-error="#alert-container"`
//! will have error alerts swapped into the fixed alert container in [crate::html::base].

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

/// A message to show the user after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with further details.
    Success { message: String, details: String },
    /// A success message without details.
    SuccessSimple { message: String },
    /// An error message with details on how to fix the problem.
    Error { message: String, details: String },
    /// An error message without details.
    ErrorSimple { message: String },
}

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let (is_error, message, details) = match self {
            Alert::Success { message, details } => (false, message, details),
            Alert::SuccessSimple { message } => (false, message, String::new()),
            Alert::Error { message, details } => (true, message, details),
            Alert::ErrorSimple { message } => (true, message, String::new()),
        };

        let style = if is_error {
            "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 border border-red-200 \
            dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
        } else {
            "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 border border-green-200 \
            dark:bg-gray-800 dark:text-green-400 dark:border-green-800"
        };

        html! {
            div
                role="alert"
                class=(style)
                data-alert-kind=(if is_error { "error" } else { "success" })
            {
                div class="flex items-start justify-between gap-4"
                {
                    div
                    {
                        p class="font-semibold" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="font-bold"
                        aria-label="Dismiss"
                        onclick="dismissAlert(this)"
                    {
                        "×"
                    }
                }
            }
        }
    }

    /// Render the alert with `status_code`.
    pub fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, Html(self.into_html().into_string())).into_response()
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_response_with_status(StatusCode::OK)
    }
}
