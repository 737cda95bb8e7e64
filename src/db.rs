//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, auth::create_user_table, category::create_category_table,
    transaction::create_transaction_table,
};

/// Create the tables for the domain models if they do not exist yet.
///
/// The tables are created in a single transaction, so either all of them exist afterwards or none
/// of the missing ones do.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
