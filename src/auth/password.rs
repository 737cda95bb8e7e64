//! Password validation and hashing.
//!
//! `ValidatedPassword` wraps a string and ensures it is a strong password.
//! `PasswordHash` converts a `ValidatedPassword` into a salted and hashed password.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// Passwords shorter than this are rejected before the strength check.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A password that has passed the strength check, but not yet hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check that `raw_password` is long and hard enough to guess.
    ///
    /// `user_inputs` are strings the password should not be derived from, such as the user's email.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with a hint for making the password stronger.
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        if raw_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::TooWeak(format!(
                "{MIN_PASSWORD_LENGTH}文字以上にしてください"
            )));
        }

        let analysis = zxcvbn(raw_password, user_inputs);

        if matches!(analysis.score(), Score::Three | Score::Four) {
            return Ok(Self(raw_password.to_owned()));
        }

        let hint = analysis
            .feedback()
            .map(Feedback::to_string)
            .filter(|hint| !hint.trim().is_empty())
            .unwrap_or_else(|| "推測されにくい単語や記号を組み合わせてください".to_owned());

        Err(Error::TooWeak(hint))
    }

    /// Wrap `raw_password` without checking its strength.
    ///
    /// For test fixtures and the test database tool.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Salt and hash `password` with bcrypt.
    ///
    /// Tests use a cost of 4 to keep them fast, everything else should use [PasswordHash::DEFAULT_COST].
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check `raw_password` against the stored hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
