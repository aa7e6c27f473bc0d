//! Request inspection helpers
//!
//! # Turbolinks Request Detection
//!
//! [`RequestKind::classify`] is the single source of truth for deciding
//! whether a request came from the Turbolinks frontend. It is used by the
//! middleware and by the [`TurbolinksRequest`](crate::extractors::TurbolinksRequest)
//! extractor.

use axum::http::{uri::Scheme, HeaderMap, Request};

use crate::headers::{TURBOLINKS_REFERRER, XML_HTTP_REQUEST, X_FORWARDED_PROTO, X_REQUESTED_WITH};

/// How a request relates to the Turbolinks frontend
///
/// Computed per request from the request headers; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// A plain browser request; the middleware stays out of the way
    NotAgent,
    /// A Turbolinks visit carrying `Turbolinks-Referrer`
    AgentNavigation,
    /// A script-initiated request (`X-Requested-With: XMLHttpRequest`)
    /// without a Turbolinks referrer, typically a remote form submission
    AgentXhr,
}

impl RequestKind {
    /// Classify a request from its headers
    ///
    /// With `detect_xhr` disabled, only `Turbolinks-Referrer` marks a request
    /// as coming from the frontend.
    ///
    /// # Example
    ///
    /// ```rust
    /// use axum::http::HeaderMap;
    /// use acton_turbolinks::middleware::RequestKind;
    ///
    /// let mut headers = HeaderMap::new();
    /// assert_eq!(RequestKind::classify(&headers, true), RequestKind::NotAgent);
    ///
    /// headers.insert("Turbolinks-Referrer", "http://localhost:3000/".parse().unwrap());
    /// assert_eq!(RequestKind::classify(&headers, true), RequestKind::AgentNavigation);
    /// ```
    #[must_use]
    pub fn classify(headers: &HeaderMap, detect_xhr: bool) -> Self {
        if turbolinks_referrer(headers).is_some() {
            Self::AgentNavigation
        } else if detect_xhr && is_xhr_request(headers) {
            Self::AgentXhr
        } else {
            Self::NotAgent
        }
    }

    /// Whether the frontend agent issued the request
    #[must_use]
    pub const fn is_agent(self) -> bool {
        !matches!(self, Self::NotAgent)
    }
}

/// Check if the request was sent by Turbolinks.
///
/// Equivalent to classifying with XHR detection enabled.
#[must_use]
#[inline]
pub fn is_turbolinks_request(headers: &HeaderMap) -> bool {
    RequestKind::classify(headers, true).is_agent()
}

/// Value of the `Turbolinks-Referrer` header, when present and non-empty
#[must_use]
pub fn turbolinks_referrer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(TURBOLINKS_REFERRER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Check for `X-Requested-With: XMLHttpRequest`
#[must_use]
#[inline]
pub fn is_xhr_request(headers: &HeaderMap) -> bool {
    headers
        .get(X_REQUESTED_WITH)
        .and_then(|v| v.to_str().ok())
        == Some(XML_HTTP_REQUEST)
}

/// Check if a request was received over HTTPS
///
/// True when the request URI carries the `https` scheme, or, with
/// `trust_forwarded_proto`, when a proxy reports `X-Forwarded-Proto: https`.
#[must_use]
pub fn is_secure_request<B>(request: &Request<B>, trust_forwarded_proto: bool) -> bool {
    if request.uri().scheme() == Some(&Scheme::HTTPS) {
        return true;
    }

    trust_forwarded_proto
        && request
            .headers()
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}
