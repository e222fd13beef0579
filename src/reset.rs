//! Defines the endpoint for wiping the ledger and restoring the default
//! categories.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{AppState, Error, db::reset_ledger, endpoints};

/// The state needed to reset the ledger.
#[derive(Debug, Clone)]
pub struct ResetEndpointState {
    /// The database connection for wiping the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ResetEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that deletes every transaction and category and reseeds
/// the default categories, then redirects to the ledger view.
pub async fn reset_endpoint(State(state): State<ResetEndpointState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match reset_ledger(&connection) {
        Ok(_) => (
            HxRedirect(endpoints::LEDGER_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while resetting the ledger: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        category::get_all_categories,
        db::initialize,
        reset::{ResetEndpointState, reset_endpoint},
        transaction::{
            Transaction, TransactionFilter, create_transaction, get_categorised_transactions,
        },
    };

    #[tokio::test]
    async fn reset_clears_ledger_and_redirects() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_transaction(
            Transaction::build(Decimal::ONE, date!(2024 - 03 - 05)).category_id(Some(1)),
            &connection,
        )
        .unwrap();
        let state = ResetEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = reset_endpoint(State(state.clone())).await;

        assert!(response.headers().get(HX_REDIRECT).is_some());

        let connection = state.db_connection.lock().unwrap();
        assert!(
            get_categorised_transactions(TransactionFilter::default(), &connection)
                .unwrap()
                .is_empty()
        );
        assert_eq!(get_all_categories(&connection).unwrap().len(), 5);
    }
}
