//! Integration tests for the Turbolinks protocol
//!
//! Drives the full request sequences the frontend performs against a router
//! wrapped in `TurbolinksLayer`.

use acton_turbolinks::prelude::*;
use axum::{
    body::Body,
    response::Redirect,
    routing::{get, post},
    Router,
};
use cookie::Cookie;
use http::{header, Request, StatusCode};
use tower::ServiceExt;

const REFERRER: &str = "http://localhost:3000/redirect";
const COOKIE_NAME: &str = "_turbolinks_location";

/// Helper to create a test app
fn test_app(key: Key) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/redirect", get(|| async { "redirected" }))
        .route("/internal", get(internal))
        .route("/external", get(external))
        .layer(TurbolinksLayer::new(key))
}

// Test handlers

async fn index() -> &'static str {
    "index"
}

async fn submit() -> Redirect {
    Redirect::to("/")
}

async fn internal() -> Redirect {
    Redirect::temporary("http://localhost:3000/redirect")
}

async fn external() -> Redirect {
    Redirect::temporary("https://example.com")
}

// Helpers

fn turbolinks_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Turbolinks-Referrer", REFERRER);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Non-empty pending-redirect cookie as a `Cookie` header value
fn pending_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| Cookie::parse_encoded(v.to_str().unwrap().to_string()).ok())
        .find(|c| c.name() == COOKIE_NAME && !c.value().is_empty())
        .map(|c| Cookie::new(COOKIE_NAME, c.value().to_string()).encoded().to_string())
}

fn deletes_cookie(response: &axum::response::Response) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| Cookie::parse_encoded(v.to_str().unwrap().to_string()).ok())
        .any(|c| c.name() == COOKIE_NAME && c.value().is_empty())
}

async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

// Tests

#[tokio::test]
async fn test_internal_redirect_is_announced_on_next_request() {
    let app = test_app(generate_key());

    let response = app
        .clone()
        .oneshot(turbolinks_request("GET", "/internal", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), REFERRER);
    let cookie = pending_cookie(&response).expect("pending redirect cookie");

    // The frontend follows the redirect and sends the cookie back
    let response = app
        .clone()
        .oneshot(turbolinks_request("GET", "/redirect", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("Turbolinks-Location").unwrap(),
        REFERRER
    );
    assert!(deletes_cookie(&response));
    assert!(pending_cookie(&response).is_none());
    assert_eq!(body_text(response).await, "redirected");

    // The browser dropped the cookie; nothing more to announce
    let response = app
        .oneshot(turbolinks_request("GET", "/redirect", None))
        .await
        .unwrap();
    assert!(!response.headers().contains_key("Turbolinks-Location"));
}

#[tokio::test]
async fn test_external_redirect_is_not_stashed() {
    let app = test_app(generate_key());

    let response = app
        .oneshot(turbolinks_request("GET", "/external", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://example.com"
    );
    assert!(pending_cookie(&response).is_none());
    assert!(!response.headers().contains_key("Turbolinks-Location"));
}

#[tokio::test]
async fn test_form_submission_redirect_becomes_script() {
    let app = test_app(generate_key());

    let response = app
        .oneshot(turbolinks_request("POST", "/", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/javascript"
    );
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert!(!response.headers().contains_key(header::LOCATION));
    assert_eq!(response.headers().get("X-Xhr-Redirect").unwrap(), "/");
    assert!(pending_cookie(&response).is_none());
    assert_eq!(
        body_text(response).await,
        "Turbolinks.clearCache();Turbolinks.visit(\"/\", {action: \"advance\"});"
    );
}

#[tokio::test]
async fn test_xhr_form_submission_without_referrer() {
    let app = test_app(generate_key());

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("X-Requested-With", "XMLHttpRequest")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.starts_with("Turbolinks.clearCache();"));
}

#[tokio::test]
async fn test_plain_browser_requests_are_untouched() {
    let app = test_app(generate_key());

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let request = Request::builder().uri("/internal").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_pending_redirect_survives_across_instances_sharing_a_key() {
    let key = generate_key();
    let first = test_app(key.clone());
    let second = test_app(key);

    let response = first
        .oneshot(turbolinks_request("GET", "/internal", None))
        .await
        .unwrap();
    let cookie = pending_cookie(&response).unwrap();

    let response = second
        .oneshot(turbolinks_request("GET", "/redirect", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("Turbolinks-Location").unwrap(),
        REFERRER
    );
}

#[tokio::test]
async fn test_cookie_signed_with_another_key_is_ignored() {
    let response = test_app(generate_key())
        .oneshot(turbolinks_request("GET", "/internal", None))
        .await
        .unwrap();
    let cookie = pending_cookie(&response).unwrap();

    let response = test_app(generate_key())
        .oneshot(turbolinks_request("GET", "/redirect", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("Turbolinks-Location"));
    assert_eq!(body_text(response).await, "redirected");
}
