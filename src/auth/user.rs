//! Code for creating the user table and fetching users from the database.
//!
//! A user without an email address and password is anonymous. Anonymous users
//! are created automatically for new browsers and can later be upgraded to a
//! credentialed user, keeping the same ID and therefore all of their data.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The email address and password hash of a credentialed user.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    /// The address the user signs in with.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email and password, `None` for anonymous users.
    pub credentials: Option<Credentials>,
    /// When the user was first created.
    pub created_at: OffsetDateTime,
}

impl User {
    /// Whether the user has yet to attach an email and password.
    pub fn is_anonymous(&self) -> bool {
        self.credentials.is_none()
    }

    /// The user's email address, if they have one.
    pub fn email(&self) -> Option<&EmailAddress> {
        self.credentials.as_ref().map(|credentials| &credentials.email)
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT UNIQUE,
                password TEXT,
                created_at TEXT NOT NULL,
                CHECK ((email IS NULL) = (password IS NULL))
                )",
        (),
    )?;

    Ok(())
}

/// Create a user without an email or password.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn create_anonymous_user(connection: &Connection) -> Result<User, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute("INSERT INTO user (created_at) VALUES (?1)", (created_at,))?;

    Ok(User {
        id: UserID::new(connection.last_insert_rowid()),
        credentials: None,
        created_at,
    })
}

/// Create a user that can sign in with `email` and a password.
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateEmail] if another user already has `email`,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_credentialed_user(
    email: EmailAddress,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO user (email, password, created_at) VALUES (?1, ?2, ?3)",
        (email.to_string(), password_hash.as_ref(), created_at),
    )?;

    Ok(User {
        id: UserID::new(connection.last_insert_rowid()),
        credentials: Some(Credentials {
            email,
            password_hash,
        }),
        created_at,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a user ([Error::NotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password, created_at FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the credentialed user that signs in with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has `email`.
pub fn get_user_by_email(email: &EmailAddress, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password, created_at FROM user WHERE email = :email")?
        .query_row(&[(":email", &email.to_string())], map_user_row)
        .map_err(|error| error.into())
}

/// Attach `email` and `password_hash` to the anonymous user `user_id`.
///
/// The user keeps its ID, so everything it owns stays with it.
///
/// # Errors
///
/// This function will return a:
/// - [Error::AlreadyRegistered] if the user already has credentials,
/// - [Error::DuplicateEmail] if another user already has `email`,
/// - [Error::NotFound] if there is no user with `user_id`,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn upgrade_user(
    user_id: UserID,
    email: EmailAddress,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET email = ?1, password = ?2 WHERE id = ?3 AND email IS NULL",
        (email.to_string(), password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        // Distinguish between a missing user and one that already has credentials.
        get_user_by_id(user_id, connection)?;
        return Err(Error::AlreadyRegistered);
    }

    get_user_by_id(user_id, connection)
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = UserID::new(row.get(0)?);
    let raw_email: Option<String> = row.get(1)?;
    let raw_password_hash: Option<String> = row.get(2)?;
    let created_at = row.get(3)?;

    let credentials = match (raw_email, raw_password_hash) {
        (Some(raw_email), Some(raw_password_hash)) => Some(Credentials {
            email: EmailAddress::new_unchecked(raw_email),
            password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        }),
        _ => None,
    };

    Ok(User {
        id,
        credentials,
        created_at,
    })
}

#[cfg(test)]
mod user_tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{PasswordHash, UserID},
    };

    use super::{
        create_anonymous_user, create_credentialed_user, create_user_table, get_user_by_email,
        get_user_by_id, upgrade_user,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).expect("Could not create user table");
        connection
    }

    fn email(raw: &str) -> EmailAddress {
        EmailAddress::from_str(raw).unwrap()
    }

    #[test]
    fn anonymous_user_has_no_credentials() {
        let connection = get_test_connection();

        let user = create_anonymous_user(&connection).unwrap();

        assert!(user.is_anonymous());
        assert_eq!(user.email(), None);
        assert_eq!(get_user_by_id(user.id, &connection), Ok(user));
    }

    #[test]
    fn each_anonymous_user_gets_a_new_id() {
        let connection = get_test_connection();

        let first = create_anonymous_user(&connection).unwrap();
        let second = create_anonymous_user(&connection).unwrap();

        assert_ne!(first.id, second.id);
    }

    #[test]
    fn get_missing_user_returns_not_found() {
        let connection = get_test_connection();

        let result = get_user_by_id(UserID::new(42), &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn upgrade_keeps_the_same_id() {
        let connection = get_test_connection();
        let user = create_anonymous_user(&connection).unwrap();

        let upgraded = upgrade_user(
            user.id,
            email("hana@example.com"),
            PasswordHash::new_unchecked("hash"),
            &connection,
        )
        .unwrap();

        assert_eq!(upgraded.id, user.id);
        assert!(!upgraded.is_anonymous());
        assert_eq!(upgraded.email(), Some(&email("hana@example.com")));
        assert_eq!(
            get_user_by_email(&email("hana@example.com"), &connection),
            Ok(upgraded)
        );
    }

    #[test]
    fn upgrade_twice_fails() {
        let connection = get_test_connection();
        let user = create_anonymous_user(&connection).unwrap();
        upgrade_user(
            user.id,
            email("hana@example.com"),
            PasswordHash::new_unchecked("hash"),
            &connection,
        )
        .unwrap();

        let result = upgrade_user(
            user.id,
            email("other@example.com"),
            PasswordHash::new_unchecked("hash"),
            &connection,
        );

        assert_eq!(result, Err(Error::AlreadyRegistered));
    }

    #[test]
    fn upgrade_with_taken_email_fails() {
        let connection = get_test_connection();
        create_credentialed_user(
            email("hana@example.com"),
            PasswordHash::new_unchecked("hash"),
            &connection,
        )
        .unwrap();
        let user = create_anonymous_user(&connection).unwrap();

        let result = upgrade_user(
            user.id,
            email("hana@example.com"),
            PasswordHash::new_unchecked("hash"),
            &connection,
        );

        assert_eq!(result, Err(Error::DuplicateEmail));
        assert!(get_user_by_id(user.id, &connection).unwrap().is_anonymous());
    }

    #[test]
    fn upgrade_missing_user_returns_not_found() {
        let connection = get_test_connection();

        let result = upgrade_user(
            UserID::new(7),
            email("hana@example.com"),
            PasswordHash::new_unchecked("hash"),
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }
}
