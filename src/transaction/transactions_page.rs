//! Defines the ledger home page: the transaction listing, the month summary
//! cards and the export links.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    AppState, Error, endpoints,
    category::{Category, CategoryId, get_all_categories},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, SUMMARY_CARD_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    summary::{MonthSummary, Period, compute_summary},
    transaction::core::{
        CategorisedTransaction, TransactionFilter, get_categorised_transactions,
    },
};

/// The query parameters accepted by the ledger page.
///
/// Everything arrives as an optional string so an empty filter form
/// submission reads the same as no filter at all.
#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    /// The month to summarise, as "YYYY-MM". Defaults to the current month.
    pub month: Option<String>,
    /// Keep transactions dated on or after this date.
    pub start: Option<String>,
    /// Keep transactions dated on or before this date.
    pub end: Option<String>,
    /// Keep transactions owned by this category.
    pub category: Option<String>,
}

impl LedgerQuery {
    /// Resolve the month parameter.
    ///
    /// An absent or empty parameter means the current month; a present but
    /// malformed one is a client error rather than a silent default.
    fn period(&self) -> Result<Period, Error> {
        match self.month.as_deref().map(str::trim) {
            None | Some("") => Ok(Period::current()),
            Some(raw) => Period::parse(raw),
        }
    }

    /// Resolve the listing filter. Unparseable dates and category IDs are
    /// treated as absent, matching how the filter form submits empty fields.
    fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            start: self.start.as_deref().and_then(parse_date),
            end: self.end.as_deref().and_then(parse_date),
            category_id: self
                .category
                .as_deref()
                .and_then(|category| category.trim().parse::<CategoryId>().ok()),
        }
    }
}

fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// The state needed for the ledger page.
#[derive(Debug, Clone)]
pub struct LedgerPageState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LedgerPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the ledger home page.
///
/// The listing honours the optional start/end/category filters; the summary
/// cards always cover the whole selected month, regardless of the filters.
pub async fn get_ledger_page(
    Query(query): Query<LedgerQuery>,
    State(state): State<LedgerPageState>,
) -> Result<Response, Error> {
    let period = query.period()?;
    let filter = query.filter();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_categorised_transactions(filter, &connection)?;
    let summary = if filter == TransactionFilter::default() {
        compute_summary(&transactions, period)
    } else {
        let unfiltered = get_categorised_transactions(TransactionFilter::default(), &connection)?;
        compute_summary(&unfiltered, period)
    };
    let categories = get_all_categories(&connection)?;

    Ok(ledger_view(period, summary, filter, &transactions, &categories).into_response())
}

// ============================================================================
// VIEWS
// ============================================================================

fn month_selector_view(period: Period) -> Markup {
    let previous_href = format!(
        "{}?month={}",
        endpoints::LEDGER_VIEW,
        period.previous().query_value()
    );
    let next_href = format!(
        "{}?month={}",
        endpoints::LEDGER_VIEW,
        period.next().query_value()
    );

    html! {
        div class="flex items-center gap-4 mb-4"
        {
            a href=(previous_href) class=(LINK_STYLE) { "< Previous" }

            form method="get" action=(endpoints::LEDGER_VIEW) class="flex items-center gap-2"
            {
                input
                    name="month"
                    id="month"
                    type="month"
                    value=(period.query_value())
                    class=(FORM_TEXT_INPUT_STYLE);

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Go" }
            }

            a href=(next_href) class=(LINK_STYLE) { "Next >" }
        }
    }
}

fn summary_cards_view(period: Period, summary: MonthSummary) -> Markup {
    html! {
        h2 class="text-xl font-bold mb-2" { "Summary for " (period.label()) }

        div class="flex flex-wrap gap-4 mb-6"
        {
            div class=(SUMMARY_CARD_STYLE)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Income" }
                p class="text-2xl font-semibold text-green-600 dark:text-green-400"
                {
                    (format_currency(summary.total_income))
                }
            }

            div class=(SUMMARY_CARD_STYLE)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Expenses" }
                p class="text-2xl font-semibold text-red-600 dark:text-red-400"
                {
                    (format_currency(summary.total_expense))
                }
            }

            div class=(SUMMARY_CARD_STYLE)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Balance" }
                p class="text-2xl font-semibold" { (format_currency(summary.balance())) }
            }
        }
    }
}

fn filter_form_view(filter: TransactionFilter, categories: &[Category]) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::LEDGER_VIEW)
            class="flex flex-wrap items-end gap-4 mb-6"
        {
            div
            {
                label for="start" class=(FORM_LABEL_STYLE) { "From" }
                input
                    name="start"
                    id="start"
                    type="date"
                    value=[filter.start.map(|date| date.to_string())]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end" class=(FORM_LABEL_STYLE) { "To" }
                input
                    name="end"
                    id="end"
                    type="date"
                    value=[filter.end.map(|date| date.to_string())]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select name="category" id="category" class=(FORM_SELECT_STYLE)
                {
                    option value="" selected[filter.category_id.is_none()] { "All categories" }

                    @for category in categories {
                        option
                            value=(category.id)
                            selected[filter.category_id == Some(category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
        }
    }
}

fn export_links_view() -> Markup {
    html! {
        div class="flex flex-wrap gap-4 mb-6"
        {
            a href=(endpoints::EXPORT_TRANSACTIONS_CSV) class=(LINK_STYLE) { "Transactions (CSV)" }
            a href=(endpoints::EXPORT_TRANSACTIONS_XLSX) class=(LINK_STYLE) { "Transactions (XLSX)" }
            a href=(endpoints::EXPORT_SUMMARY_CSV) class=(LINK_STYLE) { "Summary (CSV)" }
            a href=(endpoints::EXPORT_SUMMARY_XLSX) class=(LINK_STYLE) { "Summary (XLSX)" }
        }
    }
}

fn transaction_table_view(transactions: &[CategorisedTransaction]) -> Markup {
    html! {
        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th class=(TABLE_CELL_STYLE) { "Date" }
                    th class=(TABLE_CELL_STYLE) { "Description" }
                    th class=(TABLE_CELL_STYLE) { "Category" }
                    th class=(TABLE_CELL_STYLE) { "Amount" }
                    th class=(TABLE_CELL_STYLE) { "Payment Method" }
                    th class=(TABLE_CELL_STYLE) { "Actions" }
                }
            }

            tbody
            {
                @if transactions.is_empty() {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) colspan="6" { "No transactions yet." }
                    }
                }

                @for transaction in transactions {
                    (transaction_row_view(transaction))
                }
            }
        }
    }
}

fn transaction_row_view(transaction: &CategorisedTransaction) -> Markup {
    let amount_style = match transaction.category_type {
        Some(crate::category::CategoryType::Income) => "text-green-600 dark:text-green-400",
        Some(crate::category::CategoryType::Expense) => "text-red-600 dark:text-red-400",
        None => "text-gray-500 dark:text-gray-400",
    };

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                (format!(
                    "{:02}/{:02}/{:04}",
                    transaction.date.day(),
                    u8::from(transaction.date.month()),
                    transaction.date.year()
                ))
            }
            td class=(TABLE_CELL_STYLE) { (transaction.description) }
            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(name) = &transaction.category_name {
                    (name)
                } @else {
                    span class="italic" { "Uncategorised" }
                }
            }
            td class=(format!("{TABLE_CELL_STYLE} {amount_style}"))
            {
                (format_currency(transaction.amount.value()))
            }
            td class=(TABLE_CELL_STYLE) { (transaction.payment_method.label()) }
            td class=(TABLE_CELL_STYLE)
            {
                a
                    href=(endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id))
                    class=(LINK_STYLE)
                {
                    "Edit"
                }
                " "
                button
                    hx-delete=(endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, transaction.id))
                    hx-confirm="Delete this transaction?"
                    hx-target="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

fn ledger_view(
    period: Period,
    summary: MonthSummary,
    filter: TransactionFilter,
    transactions: &[CategorisedTransaction],
    categories: &[Category],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::LEDGER_VIEW).into_html();

    let content = html! {
        (nav_bar)
        div id="alert-container" {}
        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Ledger" }

            (month_selector_view(period))
            (summary_cards_view(period, summary))
            (filter_form_view(filter, categories))
            (export_links_view())
            (transaction_table_view(transactions))
        }
    };

    base("Ledger", &content)
}
