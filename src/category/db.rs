//! Database operations for categories.
//!
//! Every query is scoped to a single user.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    category::{
        Category, CategoryIcon, CategoryName,
        domain::{CategoryFields, DEFAULT_CATEGORIES},
    },
    database_id::CategoryId,
};

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            icon TEXT NOT NULL,
            color TEXT NOT NULL,
            budget INTEGER NOT NULL CHECK (budget >= 0),
            display_order INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_order ON category(user_id, display_order);",
    )?;

    Ok(())
}

/// Create a category at the end of the user's list and return it with its generated ID.
pub fn create_category(
    user_id: UserID,
    fields: CategoryFields,
    connection: &Connection,
) -> Result<Category, Error> {
    let display_order: i64 = connection.query_row(
        "SELECT COALESCE(MAX(display_order) + 1, 0) FROM category WHERE user_id = ?1",
        [user_id.as_i64()],
        |row| row.get(0),
    )?;

    insert_category(user_id, fields, display_order, connection)
}

fn insert_category(
    user_id: UserID,
    fields: CategoryFields,
    display_order: i64,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (user_id, name, icon, color, budget, display_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            user_id.as_i64(),
            fields.name.as_ref(),
            fields.icon.as_ref(),
            fields.color.as_str(),
            fields.budget,
            display_order,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        user_id,
        name: fields.name,
        icon: fields.icon,
        color: fields.color,
        budget: fields.budget,
        display_order,
    })
}

/// Retrieve one of the user's categories by ID.
pub fn get_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, icon, color, budget, display_order
             FROM category WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((category_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve all of the user's categories in display order.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, icon, color, budget, display_order
             FROM category WHERE user_id = ?1
             ORDER BY display_order ASC, id ASC",
        )?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Update a category's editable fields. Returns an error if the category doesn't exist.
pub fn update_category(
    user_id: UserID,
    category_id: CategoryId,
    fields: CategoryFields,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, icon = ?2, color = ?3, budget = ?4
         WHERE id = ?5 AND user_id = ?6",
        (
            fields.name.as_ref(),
            fields.icon.as_ref(),
            fields.color.as_str(),
            fields.budget,
            category_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category by ID. Returns an error if the category doesn't exist.
///
/// Transactions in the category are kept.
pub fn delete_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Create the default categories if the user has none.
///
/// The defaults are inserted in a single SQL transaction, so either all of them
/// are created or none are.
///
/// Returns `true` if the defaults were created.
pub fn seed_default_categories(user_id: UserID, connection: &Connection) -> Result<bool, Error> {
    // Using unchecked_transaction because we only have &Connection from the MutexGuard.
    let transaction = connection.unchecked_transaction()?;

    let category_count: i64 = transaction.query_row(
        "SELECT COUNT(1) FROM category WHERE user_id = ?1",
        [user_id.as_i64()],
        |row| row.get(0),
    )?;

    if category_count > 0 {
        return Ok(false);
    }

    for (display_order, default) in (0..).zip(DEFAULT_CATEGORIES.iter()) {
        insert_category(user_id, default.into(), display_order, &transaction)?;
    }

    transaction.commit()?;

    Ok(true)
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let raw_name: String = row.get(2)?;
    let raw_icon: String = row.get(3)?;
    let raw_color: String = row.get(4)?;
    let budget = row.get(5)?;
    let display_order = row.get(6)?;

    let color = raw_color.parse().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(Category {
        id,
        user_id,
        name: CategoryName::new_unchecked(&raw_name),
        icon: CategoryIcon::new_unchecked(&raw_icon),
        color,
        budget,
        display_order,
    })
}
