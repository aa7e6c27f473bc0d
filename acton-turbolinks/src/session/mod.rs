//! Pending-redirect session store
//!
//! A single-slot, cookie-backed store that carries one redirect location
//! across exactly one request/response round trip. The cookie value is an
//! authenticated token produced by a [`CookieCodec`]; a token that fails to
//! decode is indistinguishable from no token at all.
//!
//! # Example
//!
//! ```rust
//! use acton_turbolinks::config::generate_key;
//! use acton_turbolinks::session::{CookieContext, RedirectSession};
//! use axum::http::HeaderMap;
//!
//! let session = RedirectSession::signed(generate_key());
//! let mut headers = HeaderMap::new();
//!
//! session.set(&mut headers, &CookieContext::new(None, false), "/dashboard");
//! assert!(headers.contains_key("set-cookie"));
//! ```

mod codec;

pub use codec::{CookieCodec, CookieValues, SignedCookieCodec};

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue, Request,
};
use cookie::{Cookie, Key, SameSite};
use serde_json::Value;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tracing::{debug, trace, warn};

use crate::config::TurbolinksConfig;
use crate::headers::LOCATION_COOKIE_NAME;
use crate::middleware::helpers::is_secure_request;

/// The parts of an inbound request the session store needs
///
/// Captured before the request is handed to the wrapped service, so the
/// store can still write cookies once the request itself has been consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieContext {
    token: Option<String>,
    secure: bool,
}

impl CookieContext {
    /// Build a context from a raw cookie token and the transport security
    #[must_use]
    pub const fn new(token: Option<String>, secure: bool) -> Self {
        Self { token, secure }
    }

    /// Capture the pending-redirect cookie and transport security of `request`
    ///
    /// `secure_cookies`, when configured, overrides transport detection.
    #[must_use]
    pub fn from_request<B>(request: &Request<B>, config: &TurbolinksConfig) -> Self {
        Self {
            token: find_cookie(request.headers(), &config.cookie_name),
            secure: config
                .secure_cookies
                .unwrap_or_else(|| is_secure_request(request, config.trust_forwarded_proto)),
        }
    }

    /// Raw token of the pending-redirect cookie, if the client sent one
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether the request arrived over a secure transport
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }
}

/// Cookie-backed store for the pending redirect location
#[derive(Clone)]
pub struct RedirectSession {
    codec: Arc<dyn CookieCodec>,
    cookie_name: String,
}

impl std::fmt::Debug for RedirectSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectSession")
            .field("codec", &"CookieCodec")
            .field("cookie_name", &self.cookie_name)
            .finish()
    }
}

impl RedirectSession {
    /// Create a store using `codec` for cookie `cookie_name`
    #[must_use]
    pub fn new(codec: Arc<dyn CookieCodec>, cookie_name: impl Into<String>) -> Self {
        Self {
            codec,
            cookie_name: cookie_name.into(),
        }
    }

    /// Create a store signing the default `_turbolinks_location` cookie with `key`
    #[must_use]
    pub fn signed(key: Key) -> Self {
        Self::new(Arc::new(SignedCookieCodec::new(key)), LOCATION_COOKIE_NAME)
    }

    /// Name of the cookie carrying the pending redirect
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Pending redirect location, if the request carries a valid one
    #[must_use]
    pub fn get(&self, context: &CookieContext) -> Option<String> {
        match self.decode(context)?.remove(LOCATION_COOKIE_NAME)? {
            Value::String(location) => Some(location),
            other => {
                debug!(value = %other, "Pending redirect value is not a string");
                None
            }
        }
    }

    /// Store `location` as the pending redirect
    ///
    /// Values already present in the request's token are kept; the location
    /// slot is overwritten. If encoding fails the cookie is not written.
    pub fn set(&self, response: &mut HeaderMap, context: &CookieContext, location: &str) {
        let mut values = self.decode(context).unwrap_or_default();
        values.insert(
            LOCATION_COOKIE_NAME.to_string(),
            Value::String(location.to_string()),
        );

        let token = match self.codec.encode(&self.cookie_name, &values) {
            Ok(token) => token,
            Err(err) => {
                debug!(error = %err, "Skipping pending redirect cookie");
                return;
            }
        };

        let cookie = self.cookie(token, context.secure).build();
        append_cookie(response, &cookie);
    }

    /// Expire the pending-redirect cookie on the client
    pub fn delete(&self, response: &mut HeaderMap, context: &CookieContext) {
        let cookie = self
            .cookie(String::new(), context.secure)
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build();
        append_cookie(response, &cookie);
    }

    fn cookie(&self, value: String, secure: bool) -> cookie::CookieBuilder<'static> {
        Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(secure)
    }

    fn decode(&self, context: &CookieContext) -> Option<CookieValues> {
        let token = context.token()?;
        match self.codec.decode(&self.cookie_name, token) {
            Ok(values) => Some(values),
            Err(err) => {
                trace!(error = %err, "Ignoring undecodable pending redirect cookie");
                None
            }
        }
    }
}

/// Find the first cookie called `name` across all `Cookie` headers
fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse_encoded(value.to_string()))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

fn append_cookie(headers: &mut HeaderMap, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.encoded().to_string()) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(err) => warn!(error = %err, cookie = cookie.name(), "Cookie is not a valid header value"),
    }
}
