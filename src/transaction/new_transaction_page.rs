//! Defines the page for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, endpoints,
    category::get_all_categories,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    transaction::{
        core::PaymentMethod,
        form::{TransactionFormDefaults, transaction_form_fields},
    },
};

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    /// The database connection for listing categories in the form.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for creating a transaction.
pub async fn get_new_transaction_page(
    State(state): State<NewTransactionPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)?;

    let defaults = TransactionFormDefaults {
        amount: None,
        date: OffsetDateTime::now_utc().date(),
        description: "",
        payment_method: PaymentMethod::default(),
        category_id: None,
    };

    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div id="alert-container" {}
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "New Transaction" }

            form
                hx-post=(endpoints::POST_TRANSACTION)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (transaction_form_fields(&defaults, &categories))

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Transaction" }
            }
        }
    };

    Ok(base("New Transaction", &content).into_response())
}

#[cfg(test)]
mod view_tests {
    use std::sync::{Arc, Mutex};

    use axum::{body::Body, extract::State, http::StatusCode, response::Response};
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        db::initialize,
        endpoints,
        transaction::{get_new_transaction_page, new_transaction_page::NewTransactionPageState},
    };

    fn get_test_state() -> NewTransactionPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        NewTransactionPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn new_transaction_page_returns_form() {
        let response = get_new_transaction_page(State(get_test_state()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html(response).await;

        let form_selector = Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        assert_eq!(
            forms[0].value().attr("hx-post"),
            Some(endpoints::POST_TRANSACTION)
        );

        for (name, input_type) in [("amount", "number"), ("date", "date"), ("description", "text")]
        {
            let selector = Selector::parse(&format!("input[name={name}]")).unwrap();
            let inputs = document.select(&selector).collect::<Vec<_>>();
            assert_eq!(inputs.len(), 1, "want 1 {name} input, got {}", inputs.len());
            assert_eq!(inputs[0].value().attr("type"), Some(input_type));
        }
    }

    #[tokio::test]
    async fn category_select_lists_seeded_categories() {
        let response = get_new_transaction_page(State(get_test_state()))
            .await
            .unwrap();

        let document = parse_html(response).await;

        let selector = Selector::parse("select[name=category_id] option").unwrap();
        let options = document.select(&selector).collect::<Vec<_>>();
        // The "No category" option plus the five seeded categories.
        assert_eq!(options.len(), 6, "want 6 options, got {}", options.len());
        assert_eq!(options[0].value().attr("value"), Some(""));
    }

    async fn parse_html(response: Response<Body>) -> Html {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not get response body");

        Html::parse_document(&String::from_utf8_lossy(&body))
    }
}
