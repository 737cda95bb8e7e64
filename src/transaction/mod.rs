//! Transaction management for the expense tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and deleting transactions
//! - The entry form, the history page and their endpoints

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod form;
mod transactions_page;

pub use core::{
    Transaction, TransactionBuilder, TransactionKind, create_transaction,
    create_transaction_table, create_transactions, delete_transaction, get_transactions,
};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_new_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use form::{MAX_YEN, parse_yen};
pub use transactions_page::get_transactions_page;
