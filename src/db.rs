//! Database initialization, default category seeding and the bulk reset.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    category::{CategoryType, create_category_table},
    transaction::create_transaction_table,
};

/// The categories a fresh ledger starts with, as (name, type, color) tuples.
pub const DEFAULT_CATEGORIES: [(&str, CategoryType, &str); 5] = [
    ("Salary", CategoryType::Income, "#16a34a"),
    ("Gift", CategoryType::Income, "#059669"),
    ("Food", CategoryType::Expense, "#ef4444"),
    ("Transport", CategoryType::Expense, "#f97316"),
    ("Leisure", CategoryType::Expense, "#8b5cf6"),
];

/// Create the application tables and seed the default categories.
///
/// Foreign key enforcement is switched on for the connection, so inserting a
/// transaction with a dangling category ID fails instead of orphaning the
/// row. Seeding only happens when the category table is empty, so calling
/// this on an existing database is a no-op.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&sql_transaction)?;
    create_transaction_table(&sql_transaction)?;

    let category_count: i64 =
        sql_transaction.query_row("SELECT COUNT(id) FROM category", [], |row| row.get(0))?;

    if category_count == 0 {
        seed_default_categories(&sql_transaction)?;
    }

    sql_transaction.commit()?;

    Ok(())
}

/// Delete every transaction and category and re-seed the default categories.
///
/// Runs as a single SQL transaction, so a failure part way through leaves
/// the ledger untouched.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn reset_ledger(connection: &Connection) -> Result<(), Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    sql_transaction.execute("DELETE FROM \"transaction\"", [])?;
    sql_transaction.execute("DELETE FROM category", [])?;
    seed_default_categories(&sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}

fn seed_default_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection
        .prepare("INSERT INTO category (name, category_type, color) VALUES (?1, ?2, ?3)")?;

    for (name, category_type, color) in DEFAULT_CATEGORIES {
        statement.execute((name, category_type.as_str(), color))?;
    }

    Ok(())
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        category::{CategoryName, CategoryType, get_all_categories},
        db::{initialize, reset_ledger},
        transaction::{Transaction, TransactionFilter, create_transaction,
            get_categorised_transactions},
    };

    #[test]
    fn initialize_seeds_default_categories() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let categories = get_all_categories(&connection).unwrap();
        let names: Vec<&str> = categories
            .iter()
            .map(|category| category.name.as_ref())
            .collect();
        // Sorted by type (expense before income) and then name.
        assert_eq!(names, vec!["Food", "Leisure", "Transport", "Gift", "Salary"]);
        assert_eq!(
            categories
                .iter()
                .filter(|category| category.category_type == CategoryType::Income)
                .count(),
            2
        );
    }

    #[test]
    fn initialize_twice_does_not_duplicate_seed() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();
        initialize(&connection).unwrap();

        assert_eq!(get_all_categories(&connection).unwrap().len(), 5);
    }

    #[test]
    fn reset_clears_transactions_and_reseeds_categories() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let category = crate::category::create_category(
            CategoryName::new_unchecked("Side Hustle"),
            CategoryType::Income,
            None,
            &connection,
        )
        .unwrap();
        create_transaction(
            Transaction::build(Decimal::new(500, 2), date!(2024 - 03 - 10))
                .category_id(Some(category.id)),
            &connection,
        )
        .unwrap();

        reset_ledger(&connection).unwrap();

        let transactions =
            get_categorised_transactions(TransactionFilter::default(), &connection).unwrap();
        assert!(transactions.is_empty());

        let categories = get_all_categories(&connection).unwrap();
        assert_eq!(categories.len(), 5);
        assert!(
            categories
                .iter()
                .all(|category| category.name.as_ref() != "Side Hustle")
        );
    }
}
