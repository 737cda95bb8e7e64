//! Functions for storing the session token in an encrypted cookie.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    auth::{Token, UserID},
};

pub(crate) const COOKIE_TOKEN: &str = "token";

/// The default duration for which session cookies are valid.
///
/// Anonymous users cannot sign back in, so the session is kept for a long
/// time and extended on every request.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::days(365);

/// Add a session cookie to the cookie jar, indicating which user the browser belongs to.
///
/// Sets the initial expiry of the cookie to `duration` from the current time.
///
/// # Errors
///
/// Returns an [Error::CookieError] if the token cannot be serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc() + duration;

    set_auth_cookie_with_expiry(jar, user_id, expires_at)
}

fn set_auth_cookie_with_expiry(
    jar: PrivateCookieJar,
    user_id: UserID,
    expires_at: OffsetDateTime,
) -> Result<PrivateCookieJar, Error> {
    let token = Token {
        user_id,
        expires_at,
    };
    let token_string = serde_json::to_string(&token)
        .map_err(|error| Error::CookieError(format!("could not serialize token: {error}")))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token_string))
            .path("/")
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Set the session cookie to an invalid value and set its max age to zero, which should delete
/// the cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Read and validate the session token in `jar`.
///
/// # Errors
///
/// Returns an [Error::CookieError] if the cookie is missing, cannot be
/// parsed, or has expired.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar
        .get(COOKIE_TOKEN)
        .ok_or_else(|| Error::CookieError("session cookie missing".to_owned()))?;

    let token: Token = serde_json::from_str(cookie.value_trimmed())
        .map_err(|error| Error::CookieError(format!("could not parse token: {error}")))?;

    if token.is_expired(OffsetDateTime::now_utc()) {
        return Err(Error::CookieError("session expired".to_owned()));
    }

    Ok(token)
}

/// Set the expiry of the session cookie in `jar` to the latest of UTC now
/// plus `duration` and the cookie's current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
pub fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;

    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::CookieError("cookie expiry overflowed".to_owned()))?;

    set_auth_cookie_with_expiry(jar, token.user_id, max(token.expires_at, new_expiry))
}
