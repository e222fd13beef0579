//! Defines the endpoint for updating an existing transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    transaction::{
        core::{TransactionId, update_transaction},
        form::TransactionFormData,
    },
};

/// The state needed to update a transaction.
#[derive(Debug, Clone)]
pub struct UpdateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for overwriting a transaction with the submitted form
/// values, redirects to the ledger view on success.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<UpdateTransactionState>,
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

    match update_transaction(transaction_id, builder, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::LEDGER_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(
            error @ (Error::InvalidAmount(_)
            | Error::InvalidCategory(_)
            | Error::UpdateMissingTransaction),
        ) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating transaction {transaction_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        db::initialize,
        transaction::{
            Transaction, create_transaction, form::TransactionFormData, get_transaction,
            update_transaction_endpoint,
            update_transaction_endpoint::UpdateTransactionState,
        },
    };

    fn get_test_state() -> UpdateTransactionState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        UpdateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn update_overwrites_and_redirects() {
        let state = get_test_state();
        let transaction = {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(Decimal::ONE, date!(2024 - 03 - 05)),
                &connection,
            )
            .unwrap()
        };

        let form = TransactionFormData {
            amount: Decimal::new(9999, 2),
            date: date!(2024 - 03 - 20),
            description: "updated".to_string(),
            payment_method: "card".to_string(),
            category_id: Some(1),
        };
        let response =
            update_transaction_endpoint(Path(transaction.id), State(state.clone()), Form(form))
                .await;

        assert!(response.headers().get(HX_REDIRECT).is_some());

        let connection = state.db_connection.lock().unwrap();
        let updated = get_transaction(transaction.id, &connection).unwrap();
        assert_eq!(updated.amount.to_string(), "99.99");
        assert_eq!(updated.description, "updated");
        assert_eq!(updated.category_id, Some(1));
    }

    #[tokio::test]
    async fn update_missing_transaction_returns_not_found() {
        let state = get_test_state();

        let form = TransactionFormData {
            amount: Decimal::ONE,
            date: date!(2024 - 03 - 20),
            description: String::new(),
            payment_method: "cash".to_string(),
            category_id: None,
        };
        let response = update_transaction_endpoint(Path(999999), State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_with_unknown_payment_method_returns_error_alert() {
        let state = get_test_state();
        let transaction = {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(Decimal::ONE, date!(2024 - 03 - 05)),
                &connection,
            )
            .unwrap()
        };

        let form = TransactionFormData {
            amount: Decimal::ONE,
            date: date!(2024 - 03 - 20),
            description: String::new(),
            payment_method: "cheque".to_string(),
            category_id: None,
        };
        let response =
            update_transaction_endpoint(Path(transaction.id), State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
