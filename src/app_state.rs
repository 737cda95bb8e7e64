//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use secrecy::SecretString;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    auth::DEFAULT_COOKIE_DURATION,
    db::initialize,
    receipt::{GeminiClient, ScanSessions},
    sync::ChangeFeed,
};

/// The Gemini API host.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// The Gemini model used to read receipts.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
/// How long to wait for the Gemini API before giving up on a scan.
pub const DEFAULT_SCAN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// Settings for the receipt scanner's connection to the Gemini API.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    /// The scheme and host of the API, without a trailing slash.
    pub base_url: String,
    /// The model name, e.g. "gemini-1.5-flash".
    pub model: String,
    /// The timeout for a whole request.
    pub timeout: std::time::Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
            model: DEFAULT_GEMINI_MODEL.to_owned(),
            timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Asia/Tokyo".
    pub local_timezone: String,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// Announces changes to each user's categories and transactions.
    pub change_feed: ChangeFeed,

    /// The client for the Gemini API.
    pub scanner: GeminiClient,

    /// The receipt scanning state of each user.
    pub scan_sessions: ScanSessions,

    /// The API key used for users that have not saved their own.
    pub default_api_key: Option<SecretString>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Asia/Tokyo".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or the HTTP client cannot be built.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        scanner_config: &ScannerConfig,
        default_api_key: Option<SecretString>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: connection,
            change_feed: ChangeFeed::new(),
            scanner: GeminiClient::new(scanner_config)?,
            scan_sessions: ScanSessions::new(),
            default_api_key,
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::{
        ScannerConfig,
        auth::{DEFAULT_COOKIE_DURATION, UserID, get_user_by_id},
    };

    use super::{AppState, create_cookie_key};

    #[test]
    fn new_initializes_database() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foobar",
            "Asia/Tokyo",
            &ScannerConfig::default(),
            None,
        )
        .unwrap();

        assert_eq!(state.cookie_duration, DEFAULT_COOKIE_DURATION);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_user_by_id(UserID::new(1), &connection).is_err());
    }

    #[test]
    fn cookie_key_is_deterministic() {
        assert_eq!(
            create_cookie_key("secret").master(),
            create_cookie_key("secret").master()
        );
        assert_ne!(
            create_cookie_key("secret").master(),
            create_cookie_key("other").master()
        );
    }
}
