//! Session cookie parsing and emission.

use cookie::Cookie;
use http::{HeaderMap, header::COOKIE};
use time::{Duration, OffsetDateTime};

/// Lifetime of a freshly minted session cookie.
pub const COOKIE_LIFETIME: Duration = Duration::days(3650);

/// Read the session id from the request's `Cookie` headers.
///
/// The first well-formed pair named `name` wins and malformed pairs are
/// skipped. Surrounding double quotes are stripped. The value is otherwise
/// not validated, so a present but empty cookie yields `Some("")`.
#[must_use]
pub fn session_id_from_headers(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value_trimmed().to_string())
}

/// Build the cookie announcing a newly minted session id.
///
/// Only name, value and expiry are set.
#[must_use]
pub fn session_cookie(name: &str, session_id: &str, now: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((name.to_string(), session_id.to_string()))
        .expires(now + COOKIE_LIFETIME)
        .build()
}
