//! Alert messages for telling the user that something worked or went wrong.
//!
//! Alerts are either swapped into `#alert-container` by htmx when a request
//! fails, or rendered inline at the top of a page as a notice.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

const SUCCESS_STYLE: &str = "flex items-start justify-between gap-4 p-4 mb-4 \
    text-sm text-green-800 rounded border border-green-300 bg-green-50 \
    dark:bg-gray-800 dark:text-green-400 dark:border-green-800";

const ERROR_STYLE: &str = "flex items-start justify-between gap-4 p-4 mb-4 \
    text-sm text-red-800 rounded border border-red-300 bg-red-50 \
    dark:bg-gray-800 dark:text-red-400 dark:border-red-800";

/// An alert to display to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message on its own.
    SuccessSimple { message: String },
    /// An error message and details on how to fix it.
    Error { message: String, details: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, None),
            Alert::Error { message, details } => (ERROR_STYLE, message, Some(details)),
        };

        html! {
            div role="alert" class=(style)
            {
                div
                {
                    span class="font-medium" { (message) }

                    @if let Some(details) = details {
                        span class="block mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="font-bold"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "×"
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
