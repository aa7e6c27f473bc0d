//! Header and cookie names used by the Turbolinks protocol

use axum::http::HeaderName;

/// Sent by the Turbolinks frontend on every request it performs; carries the
/// URL of the page that initiated the visit.
pub const TURBOLINKS_REFERRER: HeaderName = HeaderName::from_static("turbolinks-referrer");

/// Announces the post-redirect URL so the frontend can update the address bar.
pub const TURBOLINKS_LOCATION: HeaderName = HeaderName::from_static("turbolinks-location");

/// Conventional AJAX detection header (`X-Requested-With: XMLHttpRequest`).
pub const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// Exposes the raw redirect target on script-redirect responses.
pub const X_XHR_REDIRECT: HeaderName = HeaderName::from_static("x-xhr-redirect");

/// Value of [`X_REQUESTED_WITH`] set by XHR-based form submissions.
pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// Forwarding header a TLS-terminating proxy uses to report the client scheme.
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Name of the pending-redirect cookie and of the key inside its value map.
///
/// Matches the name Rails uses for the same purpose.
pub const LOCATION_COOKIE_NAME: &str = "_turbolinks_location";
