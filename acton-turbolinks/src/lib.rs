//! acton-turbolinks: Turbolinks redirect coordination for axum applications
//!
//! Turbolinks turns page loads into background requests, which hides the
//! redirects a server answers with. This crate provides a tower layer that
//! keeps the frontend's address bar and cache in sync with server redirects:
//!
//! - Internal redirects on Turbolinks visits are remembered in a signed
//!   cookie and announced on the next request via `Turbolinks-Location`
//! - Redirects answering form submissions become script responses that clear
//!   the frontend cache and visit the new location
//! - Requests that did not come from Turbolinks pass through untouched
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use acton_turbolinks::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     acton_turbolinks::observability::init()?;
//!
//!     // Defaults, then config files, then TURBOLINKS_* environment variables
//!     let config = TurbolinksConfig::load()?;
//!
//!     let app = axum::Router::new()
//!         .route("/", axum::routing::get(index))
//!         .layer(TurbolinksLayer::from_config(config)?);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//!
//! async fn index(TurbolinksRequest(kind): TurbolinksRequest) -> String {
//!     format!("Hello, {kind:?}!")
//! }
//! ```
//!
//! # Configuration
//!
//! See [`config::TurbolinksConfig`]. The signing key must be shared by every
//! instance serving the same users, otherwise pending redirects stashed by
//! one instance are discarded by another.

#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod headers;
pub mod middleware;
pub mod observability;
pub mod redirect;
pub mod session;

#[cfg(test)]
pub mod testing;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! # Examples
    //!
    //! ```rust
    //! use acton_turbolinks::prelude::*;
    //! ```

    // Middleware
    pub use crate::middleware::{
        is_turbolinks_request, RequestKind, ResponseSink, ResponseStaller, ResponseWriter,
        TurbolinksLayer, TurbolinksMiddleware,
    };

    // Extractors
    pub use crate::extractors::TurbolinksRequest;

    // Configuration
    pub use crate::config::{generate_key, TurbolinksConfig};

    // Redirect session
    pub use crate::session::{CookieCodec, CookieContext, RedirectSession, SignedCookieCodec};

    // Redirect handling
    pub use crate::redirect::{classify_redirect, visit_script, RedirectKind, RedirectPolicy};

    // Error types
    pub use crate::error::{CodecError, TurbolinksError};

    // Re-export key dependencies
    pub use axum;
    pub use cookie::Key;
}
