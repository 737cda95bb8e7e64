//! A consistent snapshot of one user's categories and transactions.

use rusqlite::Connection;

use crate::{
    Error,
    auth::UserID,
    category::{Category, get_categories, seed_default_categories},
    database_id::CategoryId,
    sync::{ChangeFeed, Collection},
    transaction::{Transaction, get_transactions},
};

/// Give the user the default categories if they have none.
///
/// Returns `true` if the defaults were created. Creating the defaults is
/// all-or-nothing, and calling this again once the user has categories does nothing.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the categories could not be read or written.
pub fn ensure_default_categories(user_id: UserID, connection: &Connection) -> Result<bool, Error> {
    let seeded = seed_default_categories(user_id, connection)?;

    if seeded {
        tracing::info!("Created default categories for user {user_id}");
    }

    Ok(seeded)
}

/// Load the user's categories in display order, seeding the defaults first if needed.
pub fn load_categories(
    user_id: UserID,
    connection: &Connection,
    change_feed: &ChangeFeed,
) -> Result<Vec<Category>, Error> {
    if ensure_default_categories(user_id, connection)? {
        change_feed.publish(user_id, Collection::Categories);
    }

    get_categories(user_id, connection)
}

/// Everything the pages need to know about a user's records.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerView {
    /// Sorted by display order.
    pub categories: Vec<Category>,
    /// Sorted newest first.
    pub transactions: Vec<Transaction>,
}

impl LedgerView {
    /// Load the user's categories and transactions.
    ///
    /// The default categories are created first if the user has none.
    ///
    /// # Errors
    ///
    /// Returns an [Error::SqlError] if the records could not be read.
    pub fn load(
        user_id: UserID,
        connection: &Connection,
        change_feed: &ChangeFeed,
    ) -> Result<Self, Error> {
        let categories = load_categories(user_id, connection, change_feed)?;
        let transactions = get_transactions(user_id, connection)?;

        Ok(Self {
            categories,
            transactions,
        })
    }

    /// Find a category by ID.
    ///
    /// Returns `None` for categories that have been deleted.
    pub fn category(&self, category_id: CategoryId) -> Option<&Category> {
        self.categories
            .iter()
            .find(|category| category.id == category_id)
    }
}
