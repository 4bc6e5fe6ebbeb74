use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "flash";

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// A one-shot notice carried to the next rendered view in a cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Flash {
    pub level: FlashLevel,
    #[schema(example = "Image uploaded")]
    pub message: String,
}

/// Hex-encoded JSON keeps the cookie value within the cookie octet set.
fn encode(flash: &Flash) -> String {
    serde_json::to_vec(flash)
        .map(hex::encode)
        .unwrap_or_default()
}

fn decode(value: &str) -> Option<Flash> {
    let bytes = hex::decode(value).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn flash_cookie(flash: &Flash) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, encode(flash)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Read the pending flash, if any, and schedule its removal.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let flash = decode(cookie.value());
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash)
}
