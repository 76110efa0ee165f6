use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};
use url::{Url, form_urlencoded};

use workchat_types::ADMIN_ROLE;

use crate::error::ServiceError;
use crate::session;
use crate::state::{AppState, blocking};

/// The signed-in account, inserted into request extensions by
/// [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}

/// Resolve the session to a live account. A token whose user has since been
/// deleted, or whose security stamp has rotated, resolves to `None`.
pub async fn resolve_user(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<Option<CurrentUser>, ServiceError> {
    let Some(token) = session::presented_token(jar, headers) else {
        return Ok(None);
    };
    let Some(claims) = session::decode_token(&state.config.jwt_secret, &token) else {
        debug!("Rejected invalid or expired session token");
        return Ok(None);
    };

    let user_id = claims.sub.clone();
    let user = blocking(state, move |s| Ok(s.identity.find_by_id(&user_id)?)).await?;
    Ok(user
        .filter(|u| {
            let current = u.security_stamp == claims.stamp;
            if !current {
                debug!("Rejected session for {} issued before a stamp rotation", u.id);
            }
            current
        })
        .map(|u| CurrentUser {
            id: u.id,
            email: u.email,
        }))
}

fn login_redirect(req: &Request) -> Response {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let encoded: String = form_urlencoded::byte_serialize(target.as_bytes()).collect();
    Redirect::to(&format!("/account/login?return_url={}", encoded)).into_response()
}

/// Admit signed-in users; everyone else is sent to the login page.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_user(&state, &jar, req.headers()).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(None) => login_redirect(&req),
        Err(e) => e.into_response(),
    }
}

/// Must run inside [`require_auth`]. Role membership is read from the store
/// on every request, so a demotion applies to the next request.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(user) = req.extensions().get::<CurrentUser>().cloned() else {
        return login_redirect(&req);
    };

    let user_id = user.id.clone();
    match blocking(&state, move |s| Ok(s.identity.is_in_role(&user_id, ADMIN_ROLE)?)).await {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            warn!("User {} denied admin access to {}", user.id, req.uri().path());
            ServiceError::Forbidden.into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Forged-request protection: a mutating request must declare an `Origin`
/// (or failing that a `Referer`) on the same host it was sent to.
pub async fn require_same_origin(req: Request, next: Next) -> Response {
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return next.run(req).await;
    }

    if is_same_origin(req.headers()) {
        next.run(req).await
    } else {
        warn!("Rejected cross-origin {} {}", req.method(), req.uri().path());
        ServiceError::Forbidden.into_response()
    }
}

fn is_same_origin(headers: &HeaderMap) -> bool {
    let Some(host) = headers.get(header::HOST).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let source = headers
        .get(header::ORIGIN)
        .or_else(|| headers.get(header::REFERER))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Url::parse(v).ok());
    let Some(source) = source else {
        return false;
    };

    // Read the Host header with the source's scheme so default ports compare equal.
    let Ok(target) = Url::parse(&format!("{}://{}", source.scheme(), host)) else {
        return false;
    };
    source.host_str().map(str::to_ascii_lowercase) == target.host_str().map(str::to_ascii_lowercase)
        && source.port_or_known_default() == target.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn origin_must_match_host() {
        assert!(is_same_origin(&headers(&[
            (header::HOST, "localhost:3000"),
            (header::ORIGIN, "http://localhost:3000"),
        ])));
        assert!(is_same_origin(&headers(&[
            (header::HOST, "chat.example.com"),
            (header::ORIGIN, "https://chat.example.com"),
        ])));
        assert!(!is_same_origin(&headers(&[
            (header::HOST, "localhost:3000"),
            (header::ORIGIN, "http://evil.example:3000"),
        ])));
        assert!(!is_same_origin(&headers(&[
            (header::HOST, "localhost:3000"),
            (header::ORIGIN, "http://localhost:4000"),
        ])));
    }

    #[test]
    fn referer_is_the_fallback() {
        assert!(is_same_origin(&headers(&[
            (header::HOST, "localhost:3000"),
            (header::REFERER, "http://localhost:3000/admin/users?page=2"),
        ])));
        assert!(!is_same_origin(&headers(&[(header::HOST, "localhost:3000")])));
        assert!(!is_same_origin(&headers(&[
            (header::HOST, "localhost:3000"),
            (header::ORIGIN, "null"),
        ])));
    }
}
