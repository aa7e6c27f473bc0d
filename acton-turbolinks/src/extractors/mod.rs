//! Axum extractors for acton-turbolinks
//!
//! Provides [`TurbolinksRequest`] for handlers that render differently for
//! Turbolinks visits (e.g. skipping the layout on script requests).

use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use crate::middleware::RequestKind;

/// How the current request relates to the Turbolinks frontend
///
/// Uses the classification made by the middleware for agent requests.
/// Otherwise (plain requests, or no middleware installed) the headers are
/// classified directly with XHR detection enabled, regardless of the
/// layer's `detect_xhr` setting. With `detect_xhr = false` a request carrying
/// only `X-Requested-With: XMLHttpRequest` therefore extracts as
/// [`RequestKind::AgentXhr`] even though the middleware let it pass through.
///
/// # Example
///
/// ```rust
/// use acton_turbolinks::extractors::TurbolinksRequest;
/// use acton_turbolinks::middleware::RequestKind;
///
/// async fn handler(TurbolinksRequest(kind): TurbolinksRequest) -> &'static str {
///     match kind {
///         RequestKind::NotAgent => "full page",
///         RequestKind::AgentNavigation | RequestKind::AgentXhr => "turbolinks visit",
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurbolinksRequest(pub RequestKind);

impl<S> FromRequestParts<S> for TurbolinksRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let kind = parts
            .extensions
            .get::<RequestKind>()
            .copied()
            .unwrap_or_else(|| RequestKind::classify(&parts.headers, true));
        Ok(Self(kind))
    }
}
