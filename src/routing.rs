//! Application router configuration.

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        get_edit_category_page, update_category_endpoint,
    },
    endpoints,
    export::{
        export_summary_csv, export_summary_xlsx, export_transactions_csv,
        export_transactions_xlsx,
    },
    not_found::get_404_not_found,
    reset::reset_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_edit_transaction_page,
        get_ledger_page, get_new_transaction_page, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::LEDGER_VIEW, get(get_ledger_page))
        .route(endpoints::NEW_TRANSACTION_VIEW, get(get_new_transaction_page))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .route(endpoints::POST_TRANSACTION, post(create_transaction_endpoint))
        .route(endpoints::PUT_TRANSACTION, put(update_transaction_endpoint))
        .route(
            endpoints::DELETE_TRANSACTION,
            delete(delete_transaction_endpoint),
        )
        .route(endpoints::POST_CATEGORY, post(create_category_endpoint))
        .route(endpoints::PUT_CATEGORY, put(update_category_endpoint))
        .route(endpoints::DELETE_CATEGORY, delete(delete_category_endpoint))
        .route(endpoints::POST_RESET, post(reset_endpoint))
        .route(
            endpoints::EXPORT_TRANSACTIONS_CSV,
            get(export_transactions_csv),
        )
        .route(
            endpoints::EXPORT_TRANSACTIONS_XLSX,
            get(export_transactions_xlsx),
        )
        .route(endpoints::EXPORT_SUMMARY_CSV, get(export_summary_csv))
        .route(endpoints::EXPORT_SUMMARY_XLSX, get(export_summary_xlsx))
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}
