//! The session token stored in the encrypted session cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::UserID;

/// Identifies the user a browser session belongs to and when the session lapses.
///
/// The expiry is stored as a Unix timestamp, so it has whole-second precision.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    pub user_id: UserID,

    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// Whether the token has lapsed at `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}
