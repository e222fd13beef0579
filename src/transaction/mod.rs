//! Transactions record money coming in or going out of the ledger.
//!
//! This module defines the transaction data model, the database queries for
//! it, and the views and endpoints for creating, editing and deleting
//! transactions. The ledger home page, which lists transactions alongside
//! the month summary, also lives here.

mod core;
mod create_transaction_endpoint;
mod delete_transaction_endpoint;
mod edit_transaction_page;
mod form;
mod new_transaction_page;
mod transactions_page;
mod update_transaction_endpoint;

pub use core::{
    Amount, CategorisedTransaction, PaymentMethod, Transaction, TransactionFilter,
    create_transaction, create_transaction_table, delete_transaction,
    get_categorised_transactions, get_transaction, update_transaction,
};
pub use create_transaction_endpoint::create_transaction_endpoint;
pub use delete_transaction_endpoint::delete_transaction_endpoint;
pub use edit_transaction_page::get_edit_transaction_page;
pub use new_transaction_page::get_new_transaction_page;
pub use transactions_page::get_ledger_page;
pub use update_transaction_endpoint::update_transaction_endpoint;
