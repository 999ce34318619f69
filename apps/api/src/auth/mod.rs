// Accounts and cookie sessions: password hashing, the `pb_session` cookie and
// extractors that resolve the current user from it.

pub mod extract;
pub mod handlers;
pub mod password;

use anyhow::anyhow;
use axum_extra::extract::cookie::Cookie;

use crate::store::sessions::SESSION_TTL_DAYS;

pub use extract::{MaybeUser, RequireUser};

pub const SESSION_COOKIE: &str = "pb_session";

pub const MIN_PASSWORD_LEN: usize = 6;

/// The session cookie carrying `token`. An empty token with `max_age_secs`
/// of 0 expires the cookie on the client.
fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> anyhow::Result<Cookie<'static>> {
    let secure = if secure { "; Secure" } else { "" };
    Cookie::parse(format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age_secs}; SameSite=Lax{secure}"
    ))
    .map_err(|e| anyhow!("invalid session cookie: {e}"))
}

pub fn login_cookie(token: &str, secure: bool) -> anyhow::Result<Cookie<'static>> {
    session_cookie(token, SESSION_TTL_DAYS * 24 * 60 * 60, secure)
}

pub fn logout_cookie(secure: bool) -> anyhow::Result<Cookie<'static>> {
    session_cookie("", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::SameSite;

    #[test]
    fn test_login_cookie_attributes() {
        let cookie = login_cookie("abc123", false).unwrap();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), None);
        assert!(cookie.to_string().contains("Max-Age=2592000"));
    }

    #[test]
    fn test_secure_flag_and_logout_cookie() {
        assert_eq!(login_cookie("t", true).unwrap().secure(), Some(true));
        let cleared = logout_cookie(false).unwrap();
        assert_eq!(cleared.value(), "");
        assert!(cleared.to_string().contains("Max-Age=0"));
    }
}
