//! Turbolinks-specific assertion helpers for testing
//!
//! Helpers work on plain `axum` responses as returned by
//! `tower::ServiceExt::oneshot`.

use axum::{
    http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE, X_CONTENT_TYPE_OPTIONS},
    http::StatusCode,
    response::Response,
};
use cookie::Cookie;
use http_body_util::BodyExt;

use crate::headers::{LOCATION_COOKIE_NAME, TURBOLINKS_LOCATION};

/// Collect a response body into a string
///
/// # Panics
///
/// Panics if the body fails or is not UTF-8
pub async fn body_string(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Response body is not UTF-8")
}

/// `name=value` pair of a non-empty pending-redirect cookie set by the response,
/// ready to be sent back in a `Cookie` header
///
/// # Panics
///
/// Panics if a `Set-Cookie` header cannot be parsed
#[must_use]
pub fn pending_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| {
            let raw = value.to_str().expect("Invalid Set-Cookie header value");
            Cookie::parse_encoded(raw.to_string()).expect("Invalid Set-Cookie header")
        })
        .filter(|cookie| cookie.name() == LOCATION_COOKIE_NAME && !cookie.value().is_empty())
        .map(|cookie| Cookie::new(cookie.name().to_string(), cookie.value().to_string()))
        .map(|cookie| cookie.encoded().to_string())
        .last()
}

/// Assert that the response does not store a pending redirect
///
/// # Panics
///
/// Panics if a non-empty pending-redirect cookie is set
pub fn assert_no_pending_cookie(response: &Response) {
    let cookie = pending_cookie(response);
    assert!(
        cookie.is_none(),
        "Expected no pending redirect cookie, got {cookie:?}"
    );
}

/// Assert that the response announces `expected` via `Turbolinks-Location`
///
/// # Panics
///
/// Panics if the header is missing or has a different value
pub fn assert_turbolinks_location(response: &Response, expected: &str) {
    let header = response
        .headers()
        .get(TURBOLINKS_LOCATION)
        .expect("Turbolinks-Location header not found");
    let actual = header
        .to_str()
        .expect("Invalid Turbolinks-Location header value");
    assert_eq!(
        actual, expected,
        "Expected Turbolinks-Location to be {expected}, got {actual}"
    );
}

/// Assert that the response is a script redirect with body `expected_script`
///
/// # Panics
///
/// Panics if the status, headers or body do not match a script redirect
pub async fn assert_script_redirect(response: Response, expected_script: &str) {
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).map(|v| v.as_bytes()),
        Some(b"text/javascript".as_slice())
    );
    assert_eq!(
        response
            .headers()
            .get(X_CONTENT_TYPE_OPTIONS)
            .map(|v| v.as_bytes()),
        Some(b"nosniff".as_slice())
    );
    assert!(
        !response.headers().contains_key(LOCATION),
        "Script redirect must not carry a Location header"
    );
    assert_eq!(body_string(response).await, expected_script);
}
