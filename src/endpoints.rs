//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}',
//! use [format_endpoint].

/// The ledger page: the transaction listing with the month summary cards.
pub const LEDGER_VIEW: &str = "/";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page for listing categories and creating a new one.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for editing an existing category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";

/// The route to create a transaction.
pub const POST_TRANSACTION: &str = "/api/transactions";
/// The route to update a transaction.
pub const PUT_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to delete a transaction.
pub const DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create a category.
pub const POST_CATEGORY: &str = "/api/categories";
/// The route to update a category.
pub const PUT_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to delete a category.
pub const DELETE_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to delete all records and reseed the default categories.
pub const POST_RESET: &str = "/api/reset";

/// The route serving static assets such as the stylesheet.
pub const STATIC: &str = "/static";

/// The route to download the detailed export as CSV.
pub const EXPORT_TRANSACTIONS_CSV: &str = "/export/transactions.csv";
/// The route to download the detailed export as a spreadsheet.
pub const EXPORT_TRANSACTIONS_XLSX: &str = "/export/transactions.xlsx";
/// The route to download the per-category summary export as CSV.
pub const EXPORT_SUMMARY_CSV: &str = "/export/summary.csv";
/// The route to download the per-category summary export as a spreadsheet.
pub const EXPORT_SUMMARY_XLSX: &str = "/export/summary.xlsx";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/transactions/{transaction_id}',
/// '{transaction_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (index, character) in endpoint_path.char_indices() {
        match character {
            '{' => param_start = Some(index),
            '}' => {
                param_end = Some(index);
                break;
            }
            _ => {}
        }
    }

    match (param_start, param_end) {
        (Some(start), Some(end)) => {
            let mut formatted = endpoint_path[..start].to_owned();
            formatted.push_str(&id.to_string());
            formatted.push_str(&endpoint_path[end + 1..]);
            formatted
        }
        _ => endpoint_path.to_owned(),
    }
}

#[cfg(test)]
mod format_endpoint_tests {
    use super::{DELETE_TRANSACTION, EDIT_CATEGORY_VIEW, LEDGER_VIEW, format_endpoint};

    #[test]
    fn replaces_parameter_with_id() {
        assert_eq!(
            format_endpoint(DELETE_TRANSACTION, 42),
            "/api/transactions/42"
        );
    }

    #[test]
    fn keeps_path_after_parameter() {
        assert_eq!(format_endpoint(EDIT_CATEGORY_VIEW, 7), "/categories/7/edit");
    }

    #[test]
    fn returns_path_unchanged_when_no_parameter() {
        assert_eq!(format_endpoint(LEDGER_VIEW, 1), LEDGER_VIEW);
    }
}
