//! Cookie-backed session check
//!
//! The session is the user's Discord access token stored in an HttpOnly
//! cookie. Requests without it are sent back to the landing page.

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rand::distr::Alphanumeric;
use rand::RngExt;
use subtle::ConstantTimeEq;

pub const SESSION_COOKIE: &str = "discord_access_token";
pub const STATE_COOKIE: &str = "oauth_state";

/// Lifetime of the pending login state in seconds
const STATE_MAX_AGE_SECS: u64 = 600;
const STATE_LEN: usize = 32;

/// Access token of the signed-in user, inserted by [`require_session`]
#[derive(Debug, Clone)]
pub struct AccessToken(pub String);

/// Value of the first cookie called `name`
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub async fn require_session(mut request: Request, next: Next) -> Response {
    match cookie_value(request.headers(), SESSION_COOKIE) {
        Some(token) => {
            request.extensions_mut().insert(AccessToken(token));
            next.run(request).await
        }
        None => (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response(),
    }
}

pub fn session_cookie(
    token: &str,
    secure: bool,
) -> Result<HeaderValue, header::InvalidHeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict{secure}"
    ))
}

pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "discord_access_token=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0",
    )
}

/// `SameSite=Lax` so the cookie survives the redirect back from Discord
pub fn state_cookie(state: &str) -> Result<HeaderValue, header::InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{STATE_COOKIE}={state}; Path=/; HttpOnly; SameSite=Lax; Max-Age={STATE_MAX_AGE_SECS}"
    ))
}

pub fn clear_state_cookie() -> HeaderValue {
    HeaderValue::from_static("oauth_state=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

pub fn states_match(expected: &str, received: &str) -> bool {
    expected.len() == received.len() && bool::from(expected.as_bytes().ct_eq(received.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_finds_named_cookie_among_many() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; discord_access_token=abc123; other=1"),
        );
        headers.append(header::COOKIE, HeaderValue::from_static("oauth_state=s1"));

        assert_eq!(cookie_value(&headers, SESSION_COOKIE).as_deref(), Some("abc123"));
        assert_eq!(cookie_value(&headers, STATE_COOKIE).as_deref(), Some("s1"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_is_no_session() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("discord_access_token="));
        assert_eq!(cookie_value(&headers, SESSION_COOKIE), None);
    }

    #[test]
    fn session_cookie_flags() {
        let secure = session_cookie("tok", true).unwrap();
        assert_eq!(
            secure.to_str().unwrap(),
            "discord_access_token=tok; Path=/; HttpOnly; SameSite=Strict; Secure"
        );
        let insecure = session_cookie("tok", false).unwrap();
        assert!(!insecure.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn generated_states_are_alphanumeric_and_distinct() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
        assert!(states_match(&a, &a.clone()));
        assert!(!states_match(&a, &b));
        assert!(!states_match(&a, "short"));
    }
}
