//! Session tokens. A signed JWT travels in an HttpOnly cookie; API clients
//! may send the same token as `Authorization: Bearer`.

use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use workchat_db::models::UserRow;
use workchat_types::api::Claims;

pub const SESSION_COOKIE: &str = "workchat_session";

pub fn create_token(secret: &str, user: &UserRow, hours: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        stamp: user.security_stamp.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(hours)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Claims of a valid, unexpired token.
pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// The presented token: session cookie first, then bearer header.
pub fn presented_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Only same-site paths are honoured as post-login destinations.
pub fn safe_return_url(return_url: Option<&str>) -> Option<&str> {
    return_url.filter(|url| url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\"))
}
