use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use time::{Date, macros::format_description};

use crate::{
    auth::{UserID, user::create_anonymous_user},
    category::{Category, get_categories},
    database_id::CategoryId,
    db::initialize,
    sync::{ChangeFeed, ensure_default_categories},
    transaction::{Transaction, create_transaction},
};

/// An in-memory database with a single anonymous user.
pub(crate) struct TestLedger {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
    pub user_id: UserID,
}

impl TestLedger {
    pub fn new() -> Self {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let user = create_anonymous_user(&connection).expect("Could not create test user");

        Self {
            db_connection: Arc::new(Mutex::new(connection)),
            change_feed: ChangeFeed::new(),
            user_id: user.id,
        }
    }

    pub fn with_default_categories() -> Self {
        let ledger = Self::new();
        ensure_default_categories(ledger.user_id, &ledger.connection())
            .expect("Could not create default categories");
        ledger
    }

    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.db_connection.lock().expect("Could not lock database")
    }

    pub fn categories(&self) -> Vec<Category> {
        get_categories(self.user_id, &self.connection()).expect("Could not get categories")
    }

    /// A category that belongs to a different user.
    pub fn foreign_category(&self) -> CategoryId {
        let connection = self.connection();
        let other = create_anonymous_user(&connection).expect("Could not create other user");
        ensure_default_categories(other.id, &connection)
            .expect("Could not create default categories");

        get_categories(other.id, &connection).expect("Could not get categories")[0].id
    }

    /// Add an expense dated `date`, given as "YYYY-MM-DD".
    pub fn add_expense(&self, amount: i64, category_id: CategoryId, date: &str) -> Transaction {
        create_transaction(
            Transaction::build(self.user_id, amount, category_id, parse_date(date)),
            &self.connection(),
        )
        .expect("Could not create transaction")
    }
}

pub(crate) fn parse_date(date: &str) -> Date {
    Date::parse(date, format_description!("[year]-[month]-[day]")).expect("Invalid test date")
}
