//! Bridges session-store cookie mutations to HTTP cookies.

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tatame_access::{CookieMutation, SameSitePolicy, SessionCookies};
use time::Duration as TimeDuration;

/// Reads every `Cookie` header of a request.
pub fn request_cookies(headers: &HeaderMap) -> SessionCookies {
    let joined = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    SessionCookies::parse_header(&joined)
}

/// Replaces the request's `Cookie` headers with `cookies`.
pub fn replace_request_cookies(headers: &mut HeaderMap, cookies: &SessionCookies) {
    headers.remove(COOKIE);
    if cookies.is_empty() {
        return;
    }
    match HeaderValue::from_str(&cookies.to_header_value()) {
        Ok(value) => {
            headers.insert(COOKIE, value);
        }
        Err(e) => {
            tracing::warn!(error = %e, "refreshed cookies are not a valid header value");
        }
    }
}

fn same_site(policy: SameSitePolicy) -> SameSite {
    match policy {
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::None => SameSite::None,
    }
}

fn to_cookie(mutation: &CookieMutation) -> Cookie<'static> {
    match mutation {
        CookieMutation::Set {
            name,
            value,
            options,
        } => {
            let mut cookie = Cookie::build((name.clone(), value.clone()))
                .path(options.path.clone())
                .http_only(options.http_only)
                .secure(options.secure)
                .same_site(same_site(options.same_site));
            if let Some(seconds) = options.max_age_seconds {
                cookie = cookie.max_age(TimeDuration::seconds(seconds));
            }
            cookie.build()
        }
        CookieMutation::Remove { name, path } => Cookie::build((name.clone(), String::new()))
            .path(path.clone())
            .max_age(TimeDuration::ZERO)
            .build(),
    }
}

/// Builds a response jar writing `mutations`, in order.
pub fn response_jar(mutations: &[CookieMutation]) -> CookieJar {
    mutations
        .iter()
        .fold(CookieJar::new(), |jar, mutation| jar.add(to_cookie(mutation)))
}
