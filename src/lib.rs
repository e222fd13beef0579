//! Centavo is a web app for keeping a personal income and expense ledger.
//!
//! It records transactions, groups them into income and expense categories,
//! shows monthly totals for a selected month, and exports the ledger as CSV
//! or spreadsheet reports. This library provides a REST API that directly
//! serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod category;
mod db;
mod endpoints;
mod export;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod reset;
mod routing;
mod summary;
mod transaction;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;
pub use transaction::{
    Amount, PaymentMethod, Transaction, create_transaction, delete_transaction, get_transaction,
    update_transaction,
};

use crate::{
    alert::AlertView, category::CategoryId,
    internal_server_error::render_internal_server_error,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A string other than "income" or "expense" was used as a category type.
    #[error("\"{0}\" is not a valid category type, expected \"income\" or \"expense\"")]
    InvalidCategoryType(String),

    /// A transaction amount that is not a positive decimal number.
    #[error("\"{0}\" is not a valid amount, expected a positive number")]
    InvalidAmount(String),

    /// A string that does not name a known payment method.
    #[error("\"{0}\" is not a valid payment method")]
    InvalidPaymentMethod(String),

    /// The category ID used to create or update a transaction did not match
    /// a valid category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// A month parameter that could not be parsed as "YYYY-MM" with a month
    /// between 1 and 12.
    #[error("\"{0}\" is not a valid period, expected the format YYYY-MM")]
    InvalidPeriod(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist.
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a category that does not exist.
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist.
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to delete a category while transactions still reference it.
    ///
    /// The ledger refuses the deletion instead of orphaning the transactions,
    /// so the caller must delete or re-categorise them first.
    #[error("the category is still used by {transaction_count} transaction(s)")]
    CategoryInUse {
        /// How many transactions reference the category.
        transaction_count: usize,
    },

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// The export document could not be encoded.
    #[error("could not encode the export document: {0}")]
    ExportError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidPeriod(period) => render_internal_server_error(
                StatusCode::BAD_REQUEST,
                "Invalid Month",
                &format!(
                    "\"{period}\" is not a valid month. Use the format YYYY-MM, e.g. 2024-03."
                ),
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                )
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidCategory(category_id) => AlertView::error(
                "Invalid category",
                &format!("Could not find a category with the ID {category_id:?}"),
            )
            .into_response(StatusCode::BAD_REQUEST),
            Error::InvalidAmount(ref amount) => AlertView::error(
                "Invalid amount",
                &format!("\"{amount}\" is not a positive amount of money."),
            )
            .into_response(StatusCode::BAD_REQUEST),
            Error::UpdateMissingTransaction => AlertView::error(
                "Could not update transaction",
                "The transaction could not be found.",
            )
            .into_response(StatusCode::NOT_FOUND),
            Error::DeleteMissingTransaction => AlertView::error(
                "Could not delete transaction",
                "The transaction could not be found. \
                Try refreshing the page to see if the transaction has already been deleted.",
            )
            .into_response(StatusCode::NOT_FOUND),
            Error::UpdateMissingCategory => AlertView::error(
                "Could not update category",
                "The category could not be found.",
            )
            .into_response(StatusCode::NOT_FOUND),
            Error::DeleteMissingCategory => AlertView::error(
                "Could not delete category",
                "The category could not be found. \
                Try refreshing the page to see if the category has already been deleted.",
            )
            .into_response(StatusCode::NOT_FOUND),
            error @ (Error::EmptyCategoryName
            | Error::InvalidCategoryType(_)
            | Error::InvalidPaymentMethod(_)) => {
                AlertView::error("Invalid form input", &format!("Error: {error}"))
                    .into_response(StatusCode::UNPROCESSABLE_ENTITY)
            }
            Error::CategoryInUse { transaction_count } => AlertView::error(
                "Category still in use",
                &format!(
                    "The category is still used by {transaction_count} transaction(s). \
                    Delete or re-categorise those transactions first."
                ),
            )
            .into_response(StatusCode::CONFLICT),
            _ => AlertView::error(
                "Something went wrong",
                "An unexpected error occurred, check the server logs for more details.",
            )
            .into_response(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}
