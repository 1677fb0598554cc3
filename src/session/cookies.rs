use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::Config;
use crate::models::TokenPair;

fn session_cookie(config: &Config, name: &str, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Access and refresh cookies for a freshly issued token pair
pub fn session_cookies(config: &Config, pair: &TokenPair) -> (Cookie<'static>, Cookie<'static>) {
    let access = session_cookie(
        config,
        &config.access_cookie,
        pair.access_token.clone(),
        pair.access_expires_in.unwrap_or(config.access_ttl_secs),
    );
    let refresh = session_cookie(
        config,
        &config.refresh_cookie,
        pair.refresh_token.clone(),
        pair.refresh_expires_in.unwrap_or(config.refresh_ttl_secs),
    );
    (access, refresh)
}

pub fn store_session(config: &Config, jar: CookieJar, pair: &TokenPair) -> CookieJar {
    let (access, refresh) = session_cookies(config, pair);
    jar.add(access).add(refresh)
}

/// Expire both session cookies
pub fn clear_session(config: &Config, jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((config.access_cookie.clone(), "")).path("/"))
        .remove(Cookie::build((config.refresh_cookie.clone(), "")).path("/"))
}

pub fn access_token(config: &Config, jar: &CookieJar) -> Option<String> {
    non_empty(jar, &config.access_cookie)
}

pub fn refresh_token(config: &Config, jar: &CookieJar) -> Option<String> {
    non_empty(jar, &config.refresh_cookie)
}

fn non_empty(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
