//! Response staging
//!
//! A [`ResponseStaller`] sits between a wrapped handler and the real response
//! sink. Status and body writes are held back until [`ResponseStaller::send_response`],
//! while header mutations go straight to the underlying sink. That lets the
//! middleware inspect and rewrite headers (drop `Location`, add cookies) after
//! the handler has finished but before anything is sent.
//!
//! `send_response` consumes the staller, so a staged response is flushed at
//! most once, and it is the only way back to the underlying sink.

use axum::{
    body::Body,
    http::{Extensions, HeaderMap, StatusCode},
    response::Response,
};
use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;
use tracing::warn;

/// Write capabilities shared by real and staged responses
pub trait ResponseSink {
    /// Response headers
    fn headers(&self) -> &HeaderMap;

    /// Mutable response headers
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Mutable response extensions
    fn extensions_mut(&mut self) -> &mut Extensions;

    /// Set the response status
    fn write_status(&mut self, status: StatusCode);

    /// Append bytes to the response body
    fn write_body(&mut self, chunk: &[u8]);
}

/// The real response sink
///
/// Builds the outgoing response. The first status written commits it; a body
/// write before any status commits `200 OK`. Later status writes are ignored.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    extensions: Extensions,
    body: BytesMut,
}

impl ResponseWriter {
    /// Create an empty writer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed status, if any
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Body bytes written so far
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert into an axum response, defaulting the status to `200 OK`
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        *response.extensions_mut() = self.extensions;
        response
    }
}

impl ResponseSink for ResponseWriter {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    fn write_status(&mut self, status: StatusCode) {
        match self.status {
            None => self.status = Some(status),
            Some(committed) => warn!(
                %committed,
                ignored = %status,
                "Superfluous status write on committed response"
            ),
        }
    }

    fn write_body(&mut self, chunk: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(chunk);
    }
}

/// Buffering adapter over a [`ResponseSink`]
///
/// Owned by exactly one in-flight request.
#[derive(Debug)]
#[must_use = "a staged response is dropped unless `send_response` is called"]
pub struct ResponseStaller<W> {
    inner: W,
    status: Option<StatusCode>,
    buf: BytesMut,
}

impl<W: ResponseSink> ResponseStaller<W> {
    /// Stage writes destined for `inner`
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            status: None,
            buf: BytesMut::new(),
        }
    }

    /// Feed a handler's response into the staller
    ///
    /// The status is recorded, headers and extensions are merged into the
    /// underlying sink, and the body is collected into the buffer.
    ///
    /// # Errors
    ///
    /// Returns the body error if the response body fails while being read.
    pub async fn capture(&mut self, response: Response) -> Result<(), axum::Error> {
        let (parts, body) = response.into_parts();

        self.write_status(parts.status);
        self.headers_mut().extend(parts.headers);
        self.extensions_mut().extend(parts.extensions);

        let bytes: Bytes = body.collect().await?.to_bytes();
        self.write_body(&bytes);
        Ok(())
    }

    /// Status recorded so far
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Bytes buffered so far
    #[must_use]
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Discard buffered body bytes and buffer `body` instead
    pub fn replace_body(&mut self, body: impl AsRef<[u8]>) {
        self.buf.clear();
        self.buf.extend_from_slice(body.as_ref());
    }

    /// Flush the recorded status (if any) and the buffered body to the
    /// underlying sink, returning it
    pub fn send_response(self) -> W {
        let Self {
            mut inner,
            status,
            buf,
        } = self;

        if let Some(status) = status {
            inner.write_status(status);
        }
        if !buf.is_empty() {
            inner.write_body(&buf);
        }
        inner
    }
}

impl<W: ResponseSink> ResponseSink for ResponseStaller<W> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        self.inner.extensions_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn write_body(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }
}
