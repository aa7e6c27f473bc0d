//! Turbolinks redirect-coordination middleware
//!
//! Turbolinks replaces full page loads with background requests, so it never
//! sees the redirect chain a server answers with. This middleware bridges the
//! gap:
//!
//! - A redirect on a Turbolinks visit to an internal location is remembered in
//!   a signed cookie; the next request announces it with `Turbolinks-Location`
//!   so the frontend can update the address bar.
//! - A redirect answering a form submission (POST) becomes a `200` script
//!   response that clears the frontend cache and visits the new location.
//! - Requests that did not come from Turbolinks pass through untouched.
//!
//! # Example
//!
//! ```rust,no_run
//! use acton_turbolinks::config::TurbolinksConfig;
//! use acton_turbolinks::middleware::TurbolinksLayer;
//! use axum::{routing::get, Router};
//!
//! # async fn example() -> Result<(), acton_turbolinks::error::TurbolinksError> {
//! let config = TurbolinksConfig::load()?;
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "Hello, Turbolinks!" }))
//!     .layer(TurbolinksLayer::from_config(config)?);
//! # Ok(())
//! # }
//! ```

use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION, X_CONTENT_TYPE_OPTIONS},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
};
use cookie::Key;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, error, trace, warn};

use super::helpers::{turbolinks_referrer, RequestKind};
use super::staller::{ResponseSink, ResponseStaller, ResponseWriter};
use crate::config::TurbolinksConfig;
use crate::error::TurbolinksError;
use crate::headers::{TURBOLINKS_LOCATION, X_XHR_REDIRECT};
use crate::redirect::{classify_redirect, visit_script, RedirectKind, RedirectPolicy};
use crate::session::{CookieCodec, CookieContext, RedirectSession, SignedCookieCodec};

/// Layer for the Turbolinks middleware
///
/// Holds the immutable configuration and the cookie codec shared by every
/// request. The signing key is always supplied by the caller so several
/// instances can share pending redirects.
#[derive(Clone, Debug)]
pub struct TurbolinksLayer {
    config: Arc<TurbolinksConfig>,
    session: RedirectSession,
}

impl TurbolinksLayer {
    /// Create a layer with default settings signing cookies with `key`
    #[must_use]
    pub fn new(key: Key) -> Self {
        Self::with_codec(
            Arc::new(SignedCookieCodec::new(key)),
            TurbolinksConfig::default(),
        )
    }

    /// Create a layer from configuration, deriving the key from `secret_key`
    ///
    /// # Errors
    ///
    /// Returns [`TurbolinksError::InvalidKey`] if the configured secret is not
    /// valid base64 or is shorter than 64 bytes.
    pub fn from_config(config: TurbolinksConfig) -> Result<Self, TurbolinksError> {
        let key = config.signing_key()?;
        Ok(Self::with_codec(
            Arc::new(SignedCookieCodec::new(key)),
            config,
        ))
    }

    /// Create a layer with a custom cookie codec
    #[must_use]
    pub fn with_codec(codec: Arc<dyn CookieCodec>, config: TurbolinksConfig) -> Self {
        let session = RedirectSession::new(codec, config.cookie_name.clone());
        Self {
            config: Arc::new(config),
            session,
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &TurbolinksConfig {
        &self.config
    }
}

impl<S> Layer<S> for TurbolinksLayer {
    type Service = TurbolinksMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TurbolinksMiddleware {
            inner,
            config: self.config.clone(),
            session: self.session.clone(),
        }
    }
}

/// Turbolinks middleware service
#[derive(Clone, Debug)]
pub struct TurbolinksMiddleware<S> {
    inner: S,
    config: Arc<TurbolinksConfig>,
    session: RedirectSession,
}

impl<S> Service<Request> for TurbolinksMiddleware<S>
where
    S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let kind = RequestKind::classify(req.headers(), self.config.detect_xhr);
        if !kind.is_agent() {
            trace!(path = %req.uri().path(), "Not a Turbolinks request");
            return Box::pin(self.inner.call(req));
        }

        // The ready service is the one polled in `poll_ready`; leave a fresh
        // clone behind for the next call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let session = self.session.clone();
        let policy = RedirectPolicy {
            root_relative_internal: self.config.root_relative_internal,
            cross_host_root_path_internal: self.config.cross_host_root_path_internal,
        };

        let referrer = turbolinks_referrer(req.headers())
            .unwrap_or_default()
            .to_string();
        let method = req.method().clone();
        let cookies = CookieContext::from_request(&req, &self.config);
        req.extensions_mut().insert(kind);

        debug!(?kind, %method, path = %req.uri().path(), "Handling Turbolinks request");

        Box::pin(async move {
            if let Some(location) = session.get(&cookies) {
                debug!(%location, "Announcing pending Turbolinks redirect");
                let mut response = inner.call(req).await?;
                announce_location(response.headers_mut(), &location);
                session.delete(response.headers_mut(), &cookies);
                return Ok(response);
            }

            let response = inner.call(req).await?;

            let mut staller = ResponseStaller::new(ResponseWriter::new());
            if let Err(err) = staller.capture(response).await {
                error!(error = %err, "Failed to buffer response body");
                return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }

            let Some(location) = redirect_location(staller.headers()) else {
                return Ok(staller.send_response().into_response());
            };

            if method == Method::POST {
                debug!(%location, "Converting form submission redirect into script redirect");
                script_redirect(&mut staller, &location);
            } else {
                match classify_redirect(&referrer, &location, policy) {
                    Ok(RedirectKind::Internal) => {
                        debug!(
                            %location,
                            cookie = session.cookie_name(),
                            "Stashing internal redirect for the next request"
                        );
                        session.set(staller.headers_mut(), &cookies, &location);
                    }
                    Ok(RedirectKind::External) => {
                        debug!(%location, "External redirect; not stashing");
                    }
                    Err(err) => {
                        debug!(error = %err, %referrer, %location, "Unparseable redirect; not stashing");
                    }
                }
            }

            Ok(staller.send_response().into_response())
        })
    }
}

/// Non-empty `Location` header of a staged response
fn redirect_location(headers: &HeaderMap) -> Option<String> {
    headers
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Set `Turbolinks-Location` unless the handler already chose one
fn announce_location(headers: &mut HeaderMap, location: &str) {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            headers.entry(TURBOLINKS_LOCATION).or_insert(value);
        }
        Err(err) => warn!(error = %err, "Pending redirect is not a valid header value"),
    }
}

/// Rewrite a staged redirect into a `200` script that makes the frontend visit `location`
fn script_redirect<W: ResponseSink>(staller: &mut ResponseStaller<W>, location: &str) {
    let headers = staller.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/javascript"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.remove(CONTENT_LENGTH);
    if let Some(target) = headers.remove(LOCATION) {
        headers.insert(X_XHR_REDIRECT, target);
    }

    staller.write_status(StatusCode::OK);
    staller.replace_body(visit_script(location));
}
