//! End-to-end tests over a real `axum_test::TestServer`

use acton_turbolinks::prelude::*;
use axum::{response::Redirect, routing::get, Router};
use axum_test::TestServer;
use cookie::Cookie;
use http::{header, HeaderName, HeaderValue, StatusCode};

const REFERRER: &str = "http://localhost:3000/redirect";

fn referrer() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("turbolinks-referrer"),
        HeaderValue::from_static(REFERRER),
    )
}

fn server() -> TestServer {
    let app = Router::new()
        .route("/internal", get(|| async { Redirect::to("/redirect") }))
        .route(
            "/redirect",
            get(|TurbolinksRequest(kind): TurbolinksRequest| async move { format!("{kind:?}") }),
        )
        .layer(TurbolinksLayer::new(generate_key()));
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_redirect_round_trip_over_http() {
    let server = server();
    let (name, value) = referrer();

    let response = server
        .get("/internal")
        .add_header(name.clone(), value.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header not found")
        .to_str()
        .unwrap()
        .to_string();
    let cookie = Cookie::parse_encoded(set_cookie).unwrap();
    assert_eq!(cookie.name(), "_turbolinks_location");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.http_only(), Some(true));

    let cookie_header = Cookie::new(cookie.name().to_string(), cookie.value().to_string())
        .encoded()
        .to_string();

    let response = server
        .get("/redirect")
        .add_header(name, value)
        .add_header(header::COOKIE, HeaderValue::from_str(&cookie_header).unwrap())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.headers().get("Turbolinks-Location").unwrap(),
        "/redirect"
    );
    assert_eq!(response.text(), "AgentNavigation");
}

#[tokio::test]
async fn test_plain_request_reports_not_agent() {
    let response = server().get("/redirect").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "NotAgent");
}
