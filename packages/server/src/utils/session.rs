use axum_extra::extract::cookie::{Cookie, SameSite};

pub const SESSION_COOKIE: &str = "session";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// A fresh 256-bit random token, hex encoded.
pub fn new_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub fn session_cookie(token: String, ttl_hours: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(ttl_hours))
        .build()
}

/// Short-lived cookie binding the OAuth `state` to this browser.
pub fn oauth_state_cookie(nonce: String, secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, nonce))
        .path("/login")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(10))
        .build()
}

/// Cookie used to delete `name` (path must match the one it was set with).
pub fn removal_cookie(name: &'static str, path: &'static str) -> Cookie<'static> {
    Cookie::build(name).path(path).build()
}
