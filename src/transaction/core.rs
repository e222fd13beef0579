//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    category::{CategoryId, CategoryName, CategoryType},
};

/// The ID of a transaction.
pub type TransactionId = i64;

/// A positive amount of money with exactly two decimal fraction digits.
///
/// Amounts are unsigned: whether the money came in or went out is decided by
/// the type of the owning category, not by the sign of the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    /// Create an amount from a decimal value.
    ///
    /// The value is rounded to two decimal places and stored with exactly two
    /// fraction digits, so sums never accumulate rounding drift.
    ///
    /// # Errors
    /// This function will return an [Error::InvalidAmount] if `value` is zero
    /// or negative.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value <= Decimal::ZERO {
            return Err(Error::InvalidAmount(value.to_string()));
        }

        let mut value = value.round_dp(2);
        value.rescale(2);

        Ok(Self(value))
    }

    /// Create an amount without validation.
    ///
    /// The caller should ensure that the value is positive.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the positive invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(value: Decimal) -> Self {
        let mut value = value;
        value.rescale(2);

        Self(value)
    }

    /// The underlying decimal value.
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a transaction was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Paid in cash.
    #[default]
    Cash,
    /// Paid by debit or credit card.
    Card,
    /// Paid by bank transfer.
    BankTransfer,
    /// Any other payment method.
    Other,
}

impl PaymentMethod {
    /// The value stored in the database and submitted by forms.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank-transfer",
            Self::Other => "other",
        }
    }

    /// The human readable label used in views and exports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Card => "Card",
            Self::BankTransfer => "Bank Transfer",
            Self::Other => "Other",
        }
    }

    /// All payment methods in the order they appear in form selects.
    pub fn all() -> [PaymentMethod; 4] {
        [Self::Cash, Self::Card, Self::BankTransfer, Self::Other]
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "bank-transfer" => Ok(Self::BankTransfer),
            "other" => Ok(Self::Other),
            other => Err(Error::InvalidPaymentMethod(other.to_string())),
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned in this transaction.
    pub amount: Amount,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// How the transaction was paid.
    pub payment_method: PaymentMethod,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: Decimal, date: Date) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            description: String::new(),
            payment_method: PaymentMethod::default(),
            category_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Provides defaults for the optional fields; the amount is validated when
/// the builder is passed to [create_transaction] or [update_transaction].
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction. Must be positive.
    pub amount: Decimal,
    /// The date when the transaction occurred.
    pub date: Date,
    /// A human-readable description of the transaction.
    pub description: String,
    /// How the transaction was paid.
    pub payment_method: PaymentMethod,
    /// The category of the transaction, e.g. "Groceries" or "Wages".
    pub category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the payment method for the transaction.
    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    /// Set the category ID for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is zero or negative,
/// - or [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = Amount::new(builder.amount)?;

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (amount, date, description, payment_method, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, amount, date, description, payment_method, category_id",
        )?
        .query_row(
            (
                amount.to_string(),
                builder.date,
                builder.description,
                builder.payment_method.as_str(),
                builder.category_id,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(builder.category_id),
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve the transaction with `transaction_id` from the database.
///
/// # Errors
/// This function will return [Error::NotFound] if there is no such
/// transaction, or [Error::SqlError] if there is an SQL error.
pub fn get_transaction(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, amount, date, description, payment_method, category_id
             FROM \"transaction\" WHERE id = :id;",
        )?
        .query_row(&[(":id", &transaction_id)], map_transaction_row)
        .map_err(|error| error.into())
}

/// Overwrite the transaction with `transaction_id` with the builder's fields.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is zero or negative,
/// - or [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::UpdateMissingTransaction] if the transaction doesn't exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    transaction_id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<(), Error> {
    let amount = Amount::new(builder.amount)?;

    let rows_affected = connection
        .execute(
            "UPDATE \"transaction\"
             SET amount = ?1, date = ?2, description = ?3, payment_method = ?4, category_id = ?5
             WHERE id = ?6",
            (
                amount.to_string(),
                builder.date,
                builder.description,
                builder.payment_method.as_str(),
                builder.category_id,
                transaction_id,
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(builder.category_id),
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete a transaction from the database.
///
/// # Errors
/// This function will return [Error::DeleteMissingTransaction] if the
/// transaction doesn't exist, or an error if there is an SQL error.
pub fn delete_transaction(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [transaction_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// A transaction joined with its owning category's name and type.
///
/// This is the row shape consumed by the ledger listing, the month summary
/// and both exports. A transaction without a category has `None` in all
/// three category fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorisedTransaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned.
    pub amount: Amount,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// How the transaction was paid.
    pub payment_method: PaymentMethod,
    /// The ID of the owning category, if any.
    pub category_id: Option<CategoryId>,
    /// The name of the owning category, if any.
    pub category_name: Option<CategoryName>,
    /// The type of the owning category, if any.
    pub category_type: Option<CategoryType>,
}

/// Optional filters for the ledger listing query.
///
/// The date bounds are inclusive on both ends, matching the listing filter
/// form. (The month summary uses a half-open interval instead, see
/// [crate::summary::Period::date_interval].)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransactionFilter {
    /// Keep transactions dated on or after this date.
    pub start: Option<Date>,
    /// Keep transactions dated on or before this date.
    pub end: Option<Date>,
    /// Keep transactions owned by this category.
    pub category_id: Option<CategoryId>,
}

/// Get transactions joined with their category, newest first.
///
/// Rows are sorted by date descending and then ID ascending so the order
/// stays stable after updates.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_categorised_transactions(
    filter: TransactionFilter,
    connection: &Connection,
) -> Result<Vec<CategorisedTransaction>, Error> {
    let mut clauses = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(start) = filter.start {
        params.push(start.to_string());
        clauses.push(format!("\"transaction\".date >= ?{}", params.len()));
    }

    if let Some(end) = filter.end {
        params.push(end.to_string());
        clauses.push(format!("\"transaction\".date <= ?{}", params.len()));
    }

    if let Some(category_id) = filter.category_id {
        params.push(category_id.to_string());
        clauses.push(format!("\"transaction\".category_id = ?{}", params.len()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {} ", clauses.join(" AND "))
    };

    let query = format!(
        "SELECT \"transaction\".id, amount, date, description, payment_method, \
         \"transaction\".category_id, category.name, category.category_type \
         FROM \"transaction\" \
         LEFT JOIN category ON \"transaction\".category_id = category.id \
         {where_clause}\
         ORDER BY date DESC, \"transaction\".id ASC"
    );

    connection
        .prepare(&query)?
        .query_map(rusqlite::params_from_iter(params), |row| {
            let amount = parse_amount(row, 1)?;
            let payment_method = parse_payment_method(row, 4)?;
            let category_name = row
                .get::<usize, Option<String>>(6)?
                .map(|name| CategoryName::new_unchecked(&name));
            let category_type = match row.get::<usize, Option<String>>(7)? {
                Some(raw_type) => Some(parse_category_type(&raw_type, 7)?),
                None => None,
            };

            Ok(CategorisedTransaction {
                id: row.get(0)?,
                amount,
                date: row.get(2)?,
                description: row.get(3)?,
                payment_method,
                category_id: row.get(5)?,
                category_name,
                category_type,
            })
        })?
        .map(|row_result| row_result.map_err(|error| error.into()))
        .collect()
}

/// Create the transaction table.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            amount TEXT NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            payment_method TEXT NOT NULL DEFAULT 'cash',
            category_id INTEGER REFERENCES category(id),
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

/// Map a `rusqlite` row in the column order (id, amount, date, description,
/// payment_method, category_id) to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        amount: parse_amount(row, 1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        payment_method: parse_payment_method(row, 4)?,
        category_id: row.get(5)?,
    })
}

fn parse_amount(row: &Row, index: usize) -> Result<Amount, rusqlite::Error> {
    let raw_amount: String = row.get(index)?;

    Decimal::from_str(&raw_amount)
        .map(Amount::new_unchecked)
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                format!("invalid amount {raw_amount:?}: {error}").into(),
            )
        })
}

fn parse_payment_method(row: &Row, index: usize) -> Result<PaymentMethod, rusqlite::Error> {
    let raw_method: String = row.get(index)?;

    PaymentMethod::from_str(&raw_method).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            format!("invalid payment method {raw_method:?}").into(),
        )
    })
}

fn parse_category_type(raw_type: &str, index: usize) -> Result<CategoryType, rusqlite::Error> {
    CategoryType::from_str(raw_type).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            format!("invalid category type {raw_type:?}").into(),
        )
    })
}

#[cfg(test)]
mod amount_tests {
    use rust_decimal::Decimal;

    use crate::{Error, transaction::Amount};

    #[test]
    fn new_rescales_to_two_fraction_digits() {
        let amount = Amount::new(Decimal::new(123, 1)).unwrap();

        assert_eq!(amount.to_string(), "12.30");
    }

    #[test]
    fn new_rounds_extra_fraction_digits() {
        let amount = Amount::new(Decimal::new(12349, 3)).unwrap();

        assert_eq!(amount.to_string(), "12.35");
    }

    #[test]
    fn new_rejects_zero() {
        assert_eq!(
            Amount::new(Decimal::ZERO),
            Err(Error::InvalidAmount("0".to_string()))
        );
    }

    #[test]
    fn new_rejects_negative() {
        assert_eq!(
            Amount::new(Decimal::new(-100, 2)),
            Err(Error::InvalidAmount("-1.00".to_string()))
        );
    }
}
