//! Defines the templates and helpers for rendering server error pages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// Render a full error page with the given status code.
///
/// Used for errors that abort a whole page load, e.g. an invalid month
/// parameter on the ledger page. Errors during HTMX form submissions render
/// an alert fragment instead.
pub fn render_internal_server_error(
    status_code: StatusCode,
    description: &str,
    fix: &str,
) -> Response {
    let header = status_code.as_u16().to_string();
    let title = status_code
        .canonical_reason()
        .unwrap_or("Internal Server Error");

    (status_code, error_view(title, &header, description, fix)).into_response()
}
