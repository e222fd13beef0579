//! Defines the endpoint for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    transaction::{core::create_transaction, form::TransactionFormData},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new transaction, redirects to the ledger
/// view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Form(form_data): Form<TransactionFormData>,
) -> Response {
    let builder = match form_data.parse() {
        Ok(builder) => builder,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_transaction(builder, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::LEDGER_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::InvalidAmount(_) | Error::InvalidCategory(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a transaction: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{body::Body, extract::State, http::{Response, StatusCode}};
    use axum_extra::extract::Form;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        db::initialize,
        transaction::{
            TransactionFilter, create_transaction_endpoint,
            create_transaction_endpoint::CreateTransactionState, form::TransactionFormData,
            get_categorised_transactions,
        },
    };

    fn get_test_state() -> CreateTransactionState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn test_form(amount: Decimal, category_id: Option<i64>) -> TransactionFormData {
        TransactionFormData {
            amount,
            date: date!(2024 - 03 - 05),
            description: "test transaction".to_string(),
            payment_method: "cash".to_string(),
            category_id,
        }
    }

    #[tokio::test]
    async fn create_redirects_to_ledger() {
        let state = get_test_state();

        let response = create_transaction_endpoint(
            State(state.clone()),
            Form(test_form(Decimal::new(1230, 2), None)),
        )
        .await;

        assert_redirects_to_ledger(&response);

        let connection = state.db_connection.lock().unwrap();
        let transactions =
            get_categorised_transactions(TransactionFilter::default(), &connection).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount.to_string(), "12.30");
        assert_eq!(transactions[0].description, "test transaction");
    }

    #[tokio::test]
    async fn create_with_seeded_category_succeeds() {
        let state = get_test_state();

        // The seed inserts five categories, so ID 1 exists.
        let response = create_transaction_endpoint(
            State(state.clone()),
            Form(test_form(Decimal::new(1230, 2), Some(1))),
        )
        .await;

        assert_redirects_to_ledger(&response);

        let connection = state.db_connection.lock().unwrap();
        let transactions =
            get_categorised_transactions(TransactionFilter::default(), &connection).unwrap();
        assert_eq!(transactions[0].category_id, Some(1));
    }

    #[tokio::test]
    async fn create_with_invalid_category_returns_bad_request() {
        let state = get_test_state();

        let response = create_transaction_endpoint(
            State(state),
            Form(test_form(Decimal::new(1230, 2), Some(999999))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_with_non_positive_amount_returns_bad_request() {
        let state = get_test_state();

        let response =
            create_transaction_endpoint(State(state), Form(test_form(Decimal::ZERO, None))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[track_caller]
    fn assert_redirects_to_ledger(response: &Response<Body>) {
        let location = response
            .headers()
            .get(HX_REDIRECT)
            .expect("expected response to have the header hx-redirect");
        assert_eq!(location, "/", "got redirect to {location:?}, want redirect to /");
    }
}
