//! Middleware layers for acton-turbolinks
//!
//! Provides:
//! - The Turbolinks redirect-coordination layer ([`TurbolinksLayer`])
//! - Response staging used to rewrite handler responses ([`ResponseStaller`])
//! - Request classification helpers ([`RequestKind`])

pub mod helpers;
pub mod staller;
pub mod turbolinks;

pub use helpers::{is_secure_request, is_turbolinks_request, is_xhr_request, turbolinks_referrer, RequestKind};
pub use staller::{ResponseSink, ResponseStaller, ResponseWriter};
pub use turbolinks::{TurbolinksLayer, TurbolinksMiddleware};
