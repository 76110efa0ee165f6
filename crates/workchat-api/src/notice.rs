//! One-shot notices carried across a redirect in a short-lived cookie.

use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;

use workchat_types::models::Notice;

pub const NOTICE_COOKIE: &str = "workchat_notice";

fn encode(notice: &Notice) -> Option<String> {
    serde_json::to_vec(notice).ok().map(|json| B64.encode(json))
}

fn decode(raw: &str) -> Option<Notice> {
    let json = B64.decode(raw).ok()?;
    serde_json::from_slice(&json).ok()
}

/// Read and clear the pending notice. A malformed cookie is dropped.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Notice>) {
    let Some(raw) = jar.get(NOTICE_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, None);
    };
    let jar = jar.remove(Cookie::build(NOTICE_COOKIE).path("/"));
    (jar, decode(&raw))
}

pub fn put(jar: CookieJar, notice: &Notice) -> CookieJar {
    match encode(notice) {
        Some(value) => jar.add(
            Cookie::build((NOTICE_COOKIE, value))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build(),
        ),
        None => jar,
    }
}

/// Redirect to `to`, leaving `notice` for the page rendered there.
pub fn redirect(jar: CookieJar, to: &str, notice: Notice) -> (CookieJar, Redirect) {
    (put(jar, &notice), Redirect::to(to))
}
