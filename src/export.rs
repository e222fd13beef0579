//! CSV and spreadsheet exports of the ledger.
//!
//! Row generation is done once per report shape; the CSV and XLSX encoders
//! consume the same rows so the two formats can never drift apart.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    http::header,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_xlsxwriter::Workbook;

use crate::{
    AppState, Error,
    category::{CategoryId, CategoryName, CategoryType},
    transaction::{CategorisedTransaction, TransactionFilter, get_categorised_transactions},
};

/// The header row of the detailed transaction report.
pub const DETAILED_HEADER: [&str; 6] = [
    "Date",
    "Description",
    "Category",
    "Type",
    "Amount",
    "Payment Method",
];

/// The header row of the per-category summary report.
pub const SUMMARY_HEADER: [&str; 3] = ["Category", "Type", "Total"];

/// Build the detailed report rows, one per transaction, in input order.
///
/// Dates are formatted `dd/mm/yyyy` and amounts as exact decimal strings
/// with two fraction digits. Uncategorised transactions get empty category
/// and type cells.
pub fn detailed_rows(transactions: &[CategorisedTransaction]) -> Vec<[String; 6]> {
    transactions
        .iter()
        .map(|transaction| {
            [
                format!(
                    "{:02}/{:02}/{:04}",
                    transaction.date.day(),
                    u8::from(transaction.date.month()),
                    transaction.date.year()
                ),
                transaction.description.clone(),
                transaction
                    .category_name
                    .as_ref()
                    .map(|name| name.as_ref().to_owned())
                    .unwrap_or_default(),
                transaction
                    .category_type
                    .map(|category_type| category_type.label().to_owned())
                    .unwrap_or_default(),
                transaction.amount.to_string(),
                transaction.payment_method.label().to_owned(),
            ]
        })
        .collect()
}

/// Build the per-category summary rows: one row per category that owns at
/// least one transaction, with the exact sum of its amounts.
///
/// Uncategorised transactions are omitted, as are categories with no
/// transactions. Rows are ordered by category name and then ID.
pub fn category_summary_rows(transactions: &[CategorisedTransaction]) -> Vec<[String; 3]> {
    let mut totals: HashMap<CategoryId, (CategoryName, CategoryType, Decimal)> = HashMap::new();

    for transaction in transactions {
        let (Some(category_id), Some(category_name), Some(category_type)) = (
            transaction.category_id,
            transaction.category_name.as_ref(),
            transaction.category_type,
        ) else {
            continue;
        };

        totals
            .entry(category_id)
            .and_modify(|(_, _, total)| *total += transaction.amount.value())
            .or_insert_with(|| {
                (
                    category_name.clone(),
                    category_type,
                    transaction.amount.value(),
                )
            });
    }

    let mut rows: Vec<(CategoryId, CategoryName, CategoryType, Decimal)> = totals
        .into_iter()
        .map(|(id, (name, category_type, total))| (id, name, category_type, total))
        .collect();
    rows.sort_by(|left, right| {
        left.1
            .as_ref()
            .cmp(right.1.as_ref())
            .then(left.0.cmp(&right.0))
    });

    rows.into_iter()
        .map(|(_, name, category_type, total)| {
            [
                name.as_ref().to_owned(),
                category_type.label().to_owned(),
                total.to_string(),
            ]
        })
        .collect()
}

/// Encode rows as a CSV document with the header row first.
///
/// Empty input yields a header-only document.
///
/// # Errors
/// This function will return an [Error::ExportError] if the CSV writer
/// fails, which only happens on malformed record lengths.
pub fn write_csv<const N: usize>(
    header: [&str; N],
    rows: &[[String; N]],
) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(header)
        .map_err(|error| Error::ExportError(error.to_string()))?;

    for row in rows {
        writer
            .write_record(row)
            .map_err(|error| Error::ExportError(error.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::ExportError(error.to_string()))
}

/// Encode rows as an XLSX workbook with a single named sheet and the header
/// row first.
///
/// Empty input yields a workbook containing only the header row.
///
/// # Errors
/// This function will return an [Error::ExportError] if the workbook cannot
/// be serialized.
pub fn write_workbook<const N: usize>(
    sheet_name: &str,
    header: [&str; N],
    rows: &[[String; N]],
) -> Result<Vec<u8>, Error> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet
        .set_name(sheet_name)
        .map_err(|error| Error::ExportError(error.to_string()))?;

    for (column, title) in header.iter().enumerate() {
        worksheet
            .write_string(0, column as u16, *title)
            .map_err(|error| Error::ExportError(error.to_string()))?;
    }

    for (row_index, row) in rows.iter().enumerate() {
        for (column, cell) in row.iter().enumerate() {
            worksheet
                .write_string(row_index as u32 + 1, column as u16, cell)
                .map_err(|error| Error::ExportError(error.to_string()))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|error| Error::ExportError(error.to_string()))
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

const CSV_CONTENT_TYPE: &str = "text/csv";
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The state needed for the export endpoints.
#[derive(Debug, Clone)]
pub struct ExportEndpointState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn all_transactions(state: &ExportEndpointState) -> Result<Vec<CategorisedTransaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_categorised_transactions(TransactionFilter::default(), &connection)
}

fn download_response(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Route handler for downloading all transactions as CSV.
pub async fn export_transactions_csv(
    State(state): State<ExportEndpointState>,
) -> Result<Response, Error> {
    let transactions = all_transactions(&state)?;
    let body = write_csv(DETAILED_HEADER, &detailed_rows(&transactions))?;

    Ok(download_response(CSV_CONTENT_TYPE, "transactions.csv", body))
}

/// Route handler for downloading all transactions as an XLSX workbook.
pub async fn export_transactions_xlsx(
    State(state): State<ExportEndpointState>,
) -> Result<Response, Error> {
    let transactions = all_transactions(&state)?;
    let body = write_workbook("Transactions", DETAILED_HEADER, &detailed_rows(&transactions))?;

    Ok(download_response(
        XLSX_CONTENT_TYPE,
        "transactions.xlsx",
        body,
    ))
}

/// Route handler for downloading the per-category summary as CSV.
pub async fn export_summary_csv(
    State(state): State<ExportEndpointState>,
) -> Result<Response, Error> {
    let transactions = all_transactions(&state)?;
    let body = write_csv(SUMMARY_HEADER, &category_summary_rows(&transactions))?;

    Ok(download_response(CSV_CONTENT_TYPE, "summary.csv", body))
}

/// Route handler for downloading the per-category summary as an XLSX
/// workbook.
pub async fn export_summary_xlsx(
    State(state): State<ExportEndpointState>,
) -> Result<Response, Error> {
    let transactions = all_transactions(&state)?;
    let body = write_workbook("Summary", SUMMARY_HEADER, &category_summary_rows(&transactions))?;

    Ok(download_response(XLSX_CONTENT_TYPE, "summary.xlsx", body))
}

#[cfg(test)]
mod row_tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        category::{CategoryName, CategoryType},
        export::{category_summary_rows, detailed_rows},
        transaction::{Amount, CategorisedTransaction, PaymentMethod},
    };

    fn transaction_row(
        id: i64,
        amount: Decimal,
        category: Option<(i64, &str, CategoryType)>,
    ) -> CategorisedTransaction {
        CategorisedTransaction {
            id,
            amount: Amount::new_unchecked(amount),
            date: date!(2024 - 03 - 05),
            description: "weekly shop".to_owned(),
            payment_method: PaymentMethod::Card,
            category_id: category.map(|(category_id, _, _)| category_id),
            category_name: category.map(|(_, name, _)| CategoryName::new_unchecked(name)),
            category_type: category.map(|(_, _, category_type)| category_type),
        }
    }

    #[test]
    fn detailed_rows_format_every_column() {
        let rows = detailed_rows(&[transaction_row(
            1,
            Decimal::new(4250, 2),
            Some((1, "Food", CategoryType::Expense)),
        )]);

        assert_eq!(
            rows,
            vec![[
                "05/03/2024".to_owned(),
                "weekly shop".to_owned(),
                "Food".to_owned(),
                "Expense".to_owned(),
                "42.50".to_owned(),
                "Card".to_owned(),
            ]]
        );
    }

    #[test]
    fn detailed_rows_leave_category_cells_empty_when_uncategorised() {
        let rows = detailed_rows(&[transaction_row(1, Decimal::new(4250, 2), None)]);

        assert_eq!(rows[0][2], "");
        assert_eq!(rows[0][3], "");
    }

    #[test]
    fn summary_rows_group_by_category_and_sum_exactly() {
        let food = Some((1, "Food", CategoryType::Expense));
        let salary = Some((2, "Salary", CategoryType::Income));
        let transactions = [
            transaction_row(1, Decimal::new(1050, 2), food),
            transaction_row(2, Decimal::new(950, 2), food),
            transaction_row(3, Decimal::new(250000, 2), salary),
        ];

        let rows = category_summary_rows(&transactions);

        assert_eq!(
            rows,
            vec![
                ["Food".to_owned(), "Expense".to_owned(), "20.00".to_owned()],
                [
                    "Salary".to_owned(),
                    "Income".to_owned(),
                    "2500.00".to_owned()
                ],
            ]
        );
    }

    #[test]
    fn summary_rows_omit_uncategorised_transactions() {
        let transactions = [transaction_row(1, Decimal::new(1050, 2), None)];

        let rows = category_summary_rows(&transactions);

        assert!(rows.is_empty());
    }

    #[test]
    fn summary_rows_break_name_ties_by_id() {
        let transactions = [
            transaction_row(1, Decimal::ONE, Some((7, "Food", CategoryType::Expense))),
            transaction_row(2, Decimal::ONE, Some((3, "Food", CategoryType::Expense))),
        ];

        let rows = category_summary_rows(&transactions);

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row[0] == "Food"));
    }
}
