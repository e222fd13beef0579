//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTMX fragments targeting `#alert-container`, so a
//! failed form submission swaps an alert into the page instead of replacing
//! it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// Alert message types for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    /// A green alert confirming an action succeeded.
    Success,
    /// A red alert explaining why an action failed.
    Error,
}

/// Renders alert messages with appropriate styling.
#[derive(Debug, Clone)]
pub struct AlertView<'a> {
    alert_type: AlertType,
    message: &'a str,
    details: &'a str,
}

impl<'a> AlertView<'a> {
    /// Create a new success alert.
    pub fn success(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Success,
            message,
            details,
        }
    }

    /// Create a new error alert.
    pub fn error(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Error,
            message,
            details,
        }
    }

    /// Render the alert fragment.
    pub fn into_html(self) -> Markup {
        let container_style = match self.alert_type {
            AlertType::Success => {
                "p-4 mb-4 rounded-lg bg-green-50 text-green-800 \
                dark:bg-gray-800 dark:text-green-400"
            }
            AlertType::Error => {
                "p-4 mb-4 rounded-lg bg-red-50 text-red-800 \
                dark:bg-gray-800 dark:text-red-400"
            }
        };

        html! {
            div class=(container_style) role="alert"
            {
                p class="font-medium" { (self.message) }

                @if !self.details.is_empty() {
                    p class="text-sm" { (self.details) }
                }
            }
        }
    }

    /// Render the alert as an HTTP response with `status_code`.
    ///
    /// Pairing a non-2xx status with the fragment makes HTMX swap it into
    /// the `#alert-container` named by the form's `hx-target-error`.
    pub fn into_response(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }
}
