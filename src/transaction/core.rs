//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    database_id::{CategoryId, TransactionId},
    transaction::MAX_YEN,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was spent or earned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Money spent. Only expenses count towards category budgets.
    #[default]
    Expense,
    /// Money earned.
    Income,
}

impl TransactionKind {
    /// The name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(TransactionKind::Expense),
            "income" => Ok(TransactionKind::Income),
            other => Err(format!("unknown transaction kind \"{other}\"")),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A single recorded expense or income.
///
/// Transactions cannot be edited once created, only deleted.
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user who recorded the transaction.
    pub user_id: UserID,
    /// The amount of money in whole yen, never negative.
    pub amount: i64,
    /// The category the transaction belongs to.
    ///
    /// The category may have been deleted since the transaction was created.
    pub category_id: CategoryId,
    /// What was bought.
    pub item_name: String,
    /// Where it was bought.
    pub store: Option<String>,
    /// A free-form note.
    pub note: String,
    /// When the transaction happened.
    pub date: Date,
    /// Whether money was spent or earned.
    pub kind: TransactionKind,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new expense.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        user_id: UserID,
        amount: i64,
        category_id: CategoryId,
        date: Date,
    ) -> TransactionBuilder {
        TransactionBuilder {
            user_id,
            amount,
            category_id,
            item_name: String::new(),
            store: None,
            note: String::new(),
            date,
            kind: TransactionKind::Expense,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The optional text fields default to empty and the kind defaults to an expense.
///
/// # Examples
///
/// ```ignore
/// let builder = Transaction::build(user_id, 480, category_id, date!(2026 - 10 - 19))
///     .item_name("ランチ")
///     .store(Some("定食屋"));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    pub user_id: UserID,
    /// Whole yen, must not be negative.
    pub amount: i64,
    pub category_id: CategoryId,
    pub item_name: String,
    /// Empty store names are stored as `None`.
    pub store: Option<String>,
    pub note: String,
    pub date: Date,
    pub kind: TransactionKind,
}

impl TransactionBuilder {
    /// Set the item name for the transaction.
    pub fn item_name(mut self, item_name: &str) -> Self {
        self.item_name = item_name.trim().to_owned();
        self
    }

    /// Set the store for the transaction.
    pub fn store(mut self, store: Option<&str>) -> Self {
        self.store = store
            .map(str::trim)
            .filter(|store| !store.is_empty())
            .map(str::to_owned);
        self
    }

    /// Set the note for the transaction.
    pub fn note(mut self, note: &str) -> Self {
        self.note = note.trim().to_owned();
        self
    }

    /// Set whether the transaction is an expense or income.
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = kind;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const INSERT_TRANSACTION_SQL: &str = "INSERT INTO \"transaction\"
    (user_id, amount, category_id, item_name, store, note, date, kind, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    RETURNING id, user_id, amount, category_id, item_name, store, note, date, kind, created_at";

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is negative or more than [MAX_YEN],
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    insert_transaction(builder, OffsetDateTime::now_utc(), connection)
}

/// Create many transactions in a single SQL transaction.
///
/// Either every transaction is created or, if any insert fails, none are.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if any amount is negative or more than [MAX_YEN],
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transactions(
    builders: Vec<TransactionBuilder>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let tx = connection.unchecked_transaction()?;
    let created_at = OffsetDateTime::now_utc();

    let transactions = builders
        .into_iter()
        .map(|builder| insert_transaction(builder, created_at, &tx))
        .collect::<Result<Vec<_>, _>>()?;

    tx.commit()?;

    Ok(transactions)
}

fn insert_transaction(
    builder: TransactionBuilder,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if !(0..=MAX_YEN).contains(&builder.amount) {
        return Err(Error::InvalidAmount(builder.amount.to_string()));
    }

    let transaction = connection
        .prepare_cached(INSERT_TRANSACTION_SQL)?
        .query_row(
            (
                builder.user_id.as_i64(),
                builder.amount,
                builder.category_id,
                builder.item_name,
                builder.store,
                builder.note,
                builder.date,
                builder.kind,
                created_at,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve all of a user's transactions, newest first.
///
/// Transactions on the same day are ordered by when they were recorded, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, amount, category_id, item_name, store, note, date, kind, created_at
             FROM \"transaction\" WHERE user_id = ?1
             ORDER BY date DESC, created_at DESC, id DESC",
        )?
        .query_map([user_id.as_i64()], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Delete one of the user's transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if the user has no transaction with `id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// `category_id` is deliberately not a foreign key: deleting a category keeps its transactions.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            amount INTEGER NOT NULL CHECK (amount >= 0),
            category_id INTEGER NOT NULL,
            item_name TEXT NOT NULL,
            store TEXT,
            note TEXT NOT NULL,
            date TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('expense', 'income')),
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        category_id: row.get(3)?,
        item_name: row.get(4)?,
        store: row.get(5)?,
        note: row.get(6)?,
        date: row.get(7)?,
        kind: row.get(8)?,
        created_at: row.get(9)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        auth::{UserID, user::create_anonymous_user},
        db::initialize,
        transaction::{
            Transaction, TransactionKind, create_transaction, create_transactions,
            delete_transaction, get_transactions,
        },
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_anonymous_user(&conn).unwrap();
        (conn, user.id)
    }

    #[test]
    fn create_succeeds() {
        let (conn, user_id) = get_test_connection();

        let transaction = create_transaction(
            Transaction::build(user_id, 480, 1, date!(2026 - 10 - 05))
                .item_name(" ランチ ")
                .store(Some("定食屋")),
            &conn,
        )
        .expect("Could not create transaction");

        assert!(transaction.id > 0);
        assert_eq!(transaction.amount, 480);
        assert_eq!(transaction.item_name, "ランチ");
        assert_eq!(transaction.store.as_deref(), Some("定食屋"));
        assert_eq!(transaction.kind, TransactionKind::Expense);
        assert_eq!(transaction.date, date!(2026 - 10 - 05));
    }

    #[test]
    fn empty_store_is_stored_as_none() {
        let (conn, user_id) = get_test_connection();

        let transaction = create_transaction(
            Transaction::build(user_id, 480, 1, date!(2026 - 10 - 05)).store(Some("  ")),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.store, None);
    }

    #[test]
    fn create_fails_on_negative_amount() {
        let (conn, user_id) = get_test_connection();

        let result =
            create_transaction(Transaction::build(user_id, -1, 1, date!(2026 - 10 - 05)), &conn);

        assert_eq!(result, Err(Error::InvalidAmount("-1".to_owned())));
    }

    #[test]
    fn transactions_are_ordered_newest_first() {
        let (conn, user_id) = get_test_connection();
        let older = create_transaction(
            Transaction::build(user_id, 1, 1, date!(2026 - 10 - 01)),
            &conn,
        )
        .unwrap();
        let newer = create_transaction(
            Transaction::build(user_id, 2, 1, date!(2026 - 10 - 03)),
            &conn,
        )
        .unwrap();
        let same_day_later = create_transaction(
            Transaction::build(user_id, 3, 1, date!(2026 - 10 - 01)),
            &conn,
        )
        .unwrap();

        let got: Vec<_> = get_transactions(user_id, &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.id)
            .collect();

        assert_eq!(got, vec![newer.id, same_day_later.id, older.id]);
    }

    #[test]
    fn batch_create_inserts_every_transaction() {
        let (conn, user_id) = get_test_connection();
        let builders = (1..=3)
            .map(|i| Transaction::build(user_id, i * 100, 1, date!(2026 - 10 - 05)))
            .collect();

        let created = create_transactions(builders, &conn).unwrap();

        assert_eq!(created.len(), 3);
        assert_eq!(get_transactions(user_id, &conn).unwrap().len(), 3);
    }

    #[test]
    fn batch_create_is_all_or_nothing() {
        let (conn, user_id) = get_test_connection();
        let builders = vec![
            Transaction::build(user_id, 100, 1, date!(2026 - 10 - 05)),
            Transaction::build(user_id, -5, 1, date!(2026 - 10 - 05)),
        ];

        let result = create_transactions(builders, &conn);

        assert_eq!(result, Err(Error::InvalidAmount("-5".to_owned())));
        assert!(get_transactions(user_id, &conn).unwrap().is_empty());
    }

    #[test]
    fn delete_succeeds() {
        let (conn, user_id) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(user_id, 100, 1, date!(2026 - 10 - 05)),
            &conn,
        )
        .unwrap();

        delete_transaction(user_id, transaction.id, &conn).unwrap();

        assert!(get_transactions(user_id, &conn).unwrap().is_empty());
    }

    #[test]
    fn delete_missing_transaction_fails() {
        let (conn, user_id) = get_test_connection();

        let result = delete_transaction(user_id, 1337, &conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
    }

    #[test]
    fn users_cannot_see_or_delete_each_others_transactions() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_anonymous_user(&conn).unwrap();
        let transaction = create_transaction(
            Transaction::build(user_id, 100, 1, date!(2026 - 10 - 05)),
            &conn,
        )
        .unwrap();

        assert!(get_transactions(other_user.id, &conn).unwrap().is_empty());
        assert_eq!(
            delete_transaction(other_user.id, transaction.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
    }
}
